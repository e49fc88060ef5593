//! Turtle and TriG.
//!
//! Both syntaxes share the triple rules; TriG wraps them in graph blocks.
//! Rule names follow the W3C grammars (`turtleDoc`, `triples`,
//! `predicateObjectList`, `wrappedGraph`, ...).
//!
//! Besides syntax errors, the front-end reports prefixed names whose prefix
//! was not declared earlier in the document.

use std::collections::HashSet;
use std::sync::Arc;

use stardog_analysis::grammar::{
    CompletionCandidate, Grammar, ParseOutput, SyntaxError, SyntaxErrorKind,
};
use stardog_analysis::token::{Category, Token, TokenType};

use crate::lexer::{pattern, Lexer, Vocabulary};
use crate::parser::{assist_tokens, parse_tokens, Parser, Step};
use crate::rdf::{self, *};

pub const TURTLE_ENTRY_RULE: &str = "turtleDoc";
pub const TRIG_ENTRY_RULE: &str = "trigDoc";

pub const TTL_PREFIX: &str = "TTL_PREFIX";
pub const TTL_BASE: &str = "TTL_BASE";
pub const SPARQL_PREFIX: &str = "SPARQL_PREFIX";
pub const SPARQL_BASE: &str = "SPARQL_BASE";
pub const GRAPH: &str = "GRAPH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdfSyntax {
    Turtle,
    TriG,
}

impl RdfSyntax {
    pub fn entry_rule(self) -> &'static str {
        match self {
            RdfSyntax::Turtle => TURTLE_ENTRY_RULE,
            RdfSyntax::TriG => TRIG_ENTRY_RULE,
        }
    }
}

pub fn vocabulary(syntax: RdfSyntax) -> Vocabulary {
    let mut types = vec![
        TokenType::literal(TTL_PREFIX, "@prefix").with_categories(&[Category::Keyword]),
        TokenType::literal(TTL_BASE, "@base").with_categories(&[Category::Keyword]),
        TokenType::keyword(SPARQL_PREFIX, "prefix"),
        TokenType::keyword(SPARQL_BASE, "base"),
        TokenType::literal(A, "a").with_categories(&[Category::Keyword]),
    ];
    if syntax == RdfSyntax::TriG {
        types.push(TokenType::keyword(GRAPH, "graph"));
    }
    types.extend(rdf::terms(true));
    types.extend(rdf::punctuation());
    Vocabulary::new(types)
}

pub struct TurtleGrammar {
    syntax: RdfSyntax,
    vocabulary: Vocabulary,
    lexer: Lexer,
    check_prefixes: bool,
}

impl TurtleGrammar {
    pub fn new(syntax: RdfSyntax) -> Self {
        let vocabulary = vocabulary(syntax);
        let lexer = Lexer::new(&vocabulary, vec![pattern(r"^\s+"), pattern(r"^#[^\r\n]*")]);
        Self {
            syntax,
            vocabulary,
            lexer,
            check_prefixes: true,
        }
    }

    /// Stop reporting undeclared prefixes.
    pub fn without_prefix_checks(mut self) -> Self {
        self.check_prefixes = false;
        self
    }

    pub fn turtle() -> Self {
        Self::new(RdfSyntax::Turtle)
    }

    pub fn trig() -> Self {
        Self::new(RdfSyntax::TriG)
    }

    pub fn syntax(&self) -> RdfSyntax {
        self.syntax
    }

    fn entry(&self) -> fn(&mut Parser<'_>) -> Step {
        match self.syntax {
            RdfSyntax::Turtle => turtle_doc,
            RdfSyntax::TriG => trig_doc,
        }
    }
}

impl Grammar for TurtleGrammar {
    fn parse(&self, text: &str) -> ParseOutput {
        let tokens = self.lexer.tokenize(text);
        let (cst, errors) = parse_tokens(
            &self.vocabulary,
            &tokens,
            text.len(),
            self.syntax.entry_rule(),
            self.entry(),
        );
        let semantic_errors = if self.check_prefixes {
            undeclared_prefixes(&tokens)
        } else {
            Vec::new()
        };
        ParseOutput {
            cst,
            tokens,
            errors,
            semantic_errors,
            escapes: None,
        }
    }

    fn content_assist(&self, start_rule: &str, tokens: &[Token]) -> Vec<CompletionCandidate> {
        assist_tokens(&self.vocabulary, tokens, start_rule, self.entry())
    }

    fn vocabulary(&self) -> &[Arc<TokenType>] {
        self.vocabulary.types()
    }
}

/// Prefixed names used before their prefix is declared.
fn undeclared_prefixes(tokens: &[Token]) -> Vec<SyntaxError> {
    let mut declared = HashSet::new();
    let mut errors = Vec::new();
    let mut previous: Option<&Token> = None;

    for token in tokens {
        let declaring = previous.map_or(false, |prev| {
            prev.name() == TTL_PREFIX || prev.name() == SPARQL_PREFIX
        });
        if token.name() == PNAME_NS && declaring {
            declared.insert(token.image.as_str());
        } else if token.name() == PNAME_NS || token.name() == PNAME_LN {
            let prefix = token
                .image
                .find(':')
                .map_or(token.image.as_str(), |idx| &token.image[..=idx]);
            if !declared.contains(prefix) {
                errors.push(SyntaxError {
                    kind: SyntaxErrorKind::Semantic,
                    message: format!("Prefix \"{prefix}\" is not declared."),
                    token: token.clone(),
                    rule_stack: vec!["PrefixedName".to_string()],
                    previous_token: None,
                });
            }
        }
        previous = Some(token);
    }

    errors
}

// ---------------------------------------------------------------------------
// Turtle

fn turtle_doc(p: &mut Parser<'_>) -> Step {
    while starts_directive(p) || starts_triples(p) {
        p.rule("statement", |p| {
            if starts_directive(p) {
                directive(p)
            } else {
                triples(p)?;
                p.expect(PERIOD)
            }
        })?;
    }
    Ok(())
}

fn starts_directive(p: &mut Parser<'_>) -> bool {
    p.check_any(&[TTL_PREFIX, TTL_BASE, SPARQL_PREFIX, SPARQL_BASE])
}

fn directive(p: &mut Parser<'_>) -> Step {
    p.rule("directive", |p| {
        if p.check(TTL_PREFIX) {
            p.rule("prefixID", |p| {
                p.bump();
                p.expect(PNAME_NS)?;
                p.expect(IRIREF)?;
                p.expect(PERIOD)
            })
        } else if p.check(TTL_BASE) {
            p.rule("base", |p| {
                p.bump();
                p.expect(IRIREF)?;
                p.expect(PERIOD)
            })
        } else if p.check(SPARQL_PREFIX) {
            p.rule("sparqlPrefix", |p| {
                p.bump();
                p.expect(PNAME_NS)?;
                p.expect(IRIREF)
            })
        } else {
            p.rule("sparqlBase", |p| {
                p.expect(SPARQL_BASE)?;
                p.expect(IRIREF)
            })
        }
    })
}

fn starts_triples(p: &mut Parser<'_>) -> bool {
    rdf::starts_iri(p) || rdf::starts_blank_node(p) || p.check(LPAREN) || p.check(LBRACKET)
}

fn triples(p: &mut Parser<'_>) -> Step {
    p.rule("triples", |p| {
        if p.check(LBRACKET) {
            blank_node_property_list(p)?;
            if starts_verb(p) {
                predicate_object_list(p)?;
            }
            Ok(())
        } else {
            p.rule("subject", |p| {
                if rdf::starts_iri(p) {
                    rdf::iri(p)
                } else if rdf::starts_blank_node(p) {
                    rdf::blank_node(p)
                } else {
                    collection(p)
                }
            })?;
            predicate_object_list(p)
        }
    })
}

fn starts_verb(p: &mut Parser<'_>) -> bool {
    p.check(A) || rdf::starts_iri(p)
}

fn predicate_object_list(p: &mut Parser<'_>) -> Step {
    p.rule("predicateObjectList", |p| {
        verb(p)?;
        object_list(p)?;
        while p.eat(SEMICOLON) {
            if starts_verb(p) {
                verb(p)?;
                object_list(p)?;
            }
        }
        Ok(())
    })
}

fn verb(p: &mut Parser<'_>) -> Step {
    p.rule("verb", |p| {
        if p.eat(A) {
            Ok(())
        } else {
            p.rule("predicate", rdf::iri)
        }
    })
}

fn object_list(p: &mut Parser<'_>) -> Step {
    p.rule("objectList", |p| {
        object(p)?;
        while p.eat(COMMA) {
            object(p)?;
        }
        Ok(())
    })
}

fn starts_object(p: &mut Parser<'_>) -> bool {
    starts_triples(p) || rdf::starts_literal(p)
}

fn object(p: &mut Parser<'_>) -> Step {
    p.rule("object", |p| {
        if rdf::starts_iri(p) {
            rdf::iri(p)
        } else if rdf::starts_blank_node(p) {
            rdf::blank_node(p)
        } else if p.check(LPAREN) {
            collection(p)
        } else if p.check(LBRACKET) {
            blank_node_property_list(p)
        } else {
            p.rule("literal", rdf::literal)
        }
    })
}

fn blank_node_property_list(p: &mut Parser<'_>) -> Step {
    p.rule("blankNodePropertyList", |p| {
        p.expect(LBRACKET)?;
        predicate_object_list(p)?;
        p.expect(RBRACKET)
    })
}

fn collection(p: &mut Parser<'_>) -> Step {
    p.rule("collection", |p| {
        p.expect(LPAREN)?;
        while starts_object(p) {
            object(p)?;
        }
        p.expect(RPAREN)
    })
}

// ---------------------------------------------------------------------------
// TriG

fn trig_doc(p: &mut Parser<'_>) -> Step {
    loop {
        if starts_directive(p) {
            directive(p)?;
        } else if starts_block(p) {
            block(p)?;
        } else {
            return Ok(());
        }
    }
}

fn starts_block(p: &mut Parser<'_>) -> bool {
    p.check(GRAPH) || p.check(LCURLY) || starts_triples(p)
}

fn block(p: &mut Parser<'_>) -> Step {
    p.rule("block", |p| {
        if p.eat(GRAPH) {
            label_or_subject(p)?;
            wrapped_graph(p)
        } else if p.check(LCURLY) {
            wrapped_graph(p)
        } else if p.check(LBRACKET) || p.check(LPAREN) {
            p.rule("triples2", |p| {
                if p.check(LBRACKET) {
                    blank_node_property_list(p)?;
                    if starts_verb(p) {
                        predicate_object_list(p)?;
                    }
                } else {
                    collection(p)?;
                    predicate_object_list(p)?;
                }
                p.expect(PERIOD)
            })
        } else {
            p.rule("triplesOrGraph", |p| {
                label_or_subject(p)?;
                if p.check(LCURLY) {
                    wrapped_graph(p)
                } else {
                    predicate_object_list(p)?;
                    p.expect(PERIOD)
                }
            })
        }
    })
}

fn label_or_subject(p: &mut Parser<'_>) -> Step {
    p.rule("labelOrSubject", |p| {
        if rdf::starts_iri(p) {
            rdf::iri(p)
        } else {
            rdf::blank_node(p)
        }
    })
}

fn wrapped_graph(p: &mut Parser<'_>) -> Step {
    p.rule("wrappedGraph", |p| {
        p.expect(LCURLY)?;
        if starts_triples(p) {
            p.rule("triplesBlock", |p| loop {
                triples(p)?;
                if !p.eat(PERIOD) || !starts_triples(p) {
                    return Ok(());
                }
            })?;
        }
        p.expect(RCURLY)
    })
}
