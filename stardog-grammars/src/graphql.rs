//! GraphQL executable documents, with Stardog's query directives.
//!
//! Keywords are case-sensitive literals that also carry the `Name`
//! category, so they are accepted wherever a name is. The Stardog dialect
//! lexes its directives (`@optional`, `@filter`, ...) as single tokens.

use std::sync::Arc;

use stardog_analysis::grammar::{CompletionCandidate, Grammar, ParseOutput};
use stardog_analysis::token::{Category, Token, TokenType};

use crate::lexer::{pattern, Lexer, Vocabulary};
use crate::parser::{assist_tokens, parse_tokens, Parser, Step};

pub const ENTRY_RULE: &str = "Document";

pub const NAME: &str = "Name";
pub const STARDOG_DIRECTIVE: &str = "StardogDirective";

const KEYWORDS: &[(&str, &str)] = &[
    ("Query", "query"),
    ("Mutation", "mutation"),
    ("Subscription", "subscription"),
    ("Fragment", "fragment"),
    ("On", "on"),
    ("True", "true"),
    ("False", "false"),
    ("Null", "null"),
];

const PUNCTUATORS: &[(&str, &str)] = &[
    ("Bang", "!"),
    ("Dollar", "$"),
    ("LParen", "("),
    ("RParen", ")"),
    ("Spread", "..."),
    ("Colon", ":"),
    ("Equals", "="),
    ("At", "@"),
    ("LBracket", "["),
    ("RBracket", "]"),
    ("LCurly", "{"),
    ("Pipe", "|"),
    ("RCurly", "}"),
];

const STARDOG_DIRECTIVES: &[(&str, &str)] = &[
    ("OptionalDirective", "@optional"),
    ("FilterDirective", "@filter"),
    ("BindDirective", "@bind"),
    ("HideDirective", "@hide"),
    ("PrefixDirective", "@prefix"),
    ("ConfigDirective", "@config"),
    ("TypeDirective", "@type"),
    ("SkipDirective", "@skip"),
    ("IncludeDirective", "@include"),
];

const OPERATION_TYPES: [&str; 3] = ["Query", "Mutation", "Subscription"];
const DEFINITION_STARTS: [&str; 5] = ["LCurly", "Query", "Mutation", "Subscription", "Fragment"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphQlDialect {
    Standard,
    #[default]
    Stardog,
}

impl GraphQlDialect {
    /// `"standard"` selects plain GraphQL; anything else is Stardog.
    pub fn from_option(grammar: Option<&str>) -> Self {
        match grammar {
            Some(name) if name.eq_ignore_ascii_case("standard") => GraphQlDialect::Standard,
            _ => GraphQlDialect::Stardog,
        }
    }
}

pub fn vocabulary(dialect: GraphQlDialect) -> Vocabulary {
    let mut types: Vec<TokenType> = KEYWORDS
        .iter()
        .map(|(name, text)| TokenType::literal(*name, *text).with_categories(&[Category::Name]))
        .collect();
    types.push(
        TokenType::regex(NAME, pattern(r"^[_A-Za-z][_0-9A-Za-z]*"))
            .with_categories(&[Category::Name]),
    );
    types.push(
        TokenType::regex(
            "FloatValue",
            pattern(r"^-?(?:0|[1-9][0-9]*)(?:\.[0-9]+(?:[eE][+-]?[0-9]+)?|[eE][+-]?[0-9]+)"),
        )
        .with_categories(&[Category::Literal]),
    );
    types.push(
        TokenType::regex("IntValue", pattern(r"^-?(?:0|[1-9][0-9]*)"))
            .with_categories(&[Category::Literal]),
    );
    types.push(
        TokenType::regex("BlockStringValue", pattern(r#"^(?s)"""(?:(?:"|"")?(?:[^"\\]|\\.))*""""#))
            .with_categories(&[Category::Literal]),
    );
    types.push(
        TokenType::regex("StringValue", pattern(r#"^"(?:[^"\\\n\r]|\\.)*""#))
            .with_categories(&[Category::Literal]),
    );
    if dialect == GraphQlDialect::Stardog {
        types.extend(STARDOG_DIRECTIVES.iter().map(|(name, text)| {
            TokenType::literal(*name, *text).with_categories(&[Category::Directive])
        }));
        types.push(TokenType::category(STARDOG_DIRECTIVE, Category::Directive));
    }
    types.extend(PUNCTUATORS.iter().map(|(name, text)| {
        TokenType::literal(*name, *text).with_categories(&[Category::Punctuator])
    }));
    Vocabulary::new(types)
}

pub struct GraphQlGrammar {
    dialect: GraphQlDialect,
    vocabulary: Vocabulary,
    lexer: Lexer,
}

impl GraphQlGrammar {
    pub fn new(dialect: GraphQlDialect) -> Self {
        let vocabulary = vocabulary(dialect);
        // commas are insignificant in GraphQL
        let skipped = vec![
            pattern(r"^[\s,\u{FEFF}]+"),
            pattern(r"^#[^\r\n]*"),
        ];
        let lexer = Lexer::new(&vocabulary, skipped);
        Self {
            dialect,
            vocabulary,
            lexer,
        }
    }

    pub fn dialect(&self) -> GraphQlDialect {
        self.dialect
    }

    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        self.lexer.tokenize(text)
    }
}

impl Grammar for GraphQlGrammar {
    fn parse(&self, text: &str) -> ParseOutput {
        let tokens = self.lexer.tokenize(text);
        let (cst, errors) = parse_tokens(&self.vocabulary, &tokens, text.len(), ENTRY_RULE, document);
        ParseOutput {
            cst,
            tokens,
            errors,
            semantic_errors: Vec::new(),
            escapes: None,
        }
    }

    fn content_assist(&self, start_rule: &str, tokens: &[Token]) -> Vec<CompletionCandidate> {
        assist_tokens(&self.vocabulary, tokens, start_rule, document)
    }

    fn vocabulary(&self) -> &[Arc<TokenType>] {
        self.vocabulary.types()
    }
}

fn document(p: &mut Parser<'_>) -> Step {
    p.one_or_more(starts_definition, definition, &DEFINITION_STARTS)
}

fn starts_definition(p: &mut Parser<'_>) -> bool {
    p.check_any(&DEFINITION_STARTS)
}

fn definition(p: &mut Parser<'_>) -> Step {
    p.rule("Definition", |p| {
        if p.check("Fragment") {
            fragment_definition(p)
        } else {
            operation_definition(p)
        }
    })
}

fn operation_definition(p: &mut Parser<'_>) -> Step {
    p.rule("OperationDefinition", |p| {
        if p.check("LCurly") {
            return selection_set(p);
        }
        p.rule("OperationType", |p| {
            if p.check_any(&OPERATION_TYPES) {
                p.bump();
                Ok(())
            } else {
                p.no_viable_alternative(&OPERATION_TYPES)
            }
        })?;
        p.eat_category(Category::Name, NAME);
        if p.check("LParen") {
            variable_definitions(p)?;
        }
        directives(p)?;
        selection_set(p)
    })
}

fn fragment_definition(p: &mut Parser<'_>) -> Step {
    p.rule("FragmentDefinition", |p| {
        p.expect("Fragment")?;
        p.rule("FragmentName", name)?;
        type_condition(p)?;
        directives(p)?;
        selection_set(p)
    })
}

fn type_condition(p: &mut Parser<'_>) -> Step {
    p.rule("TypeCondition", |p| {
        p.expect("On")?;
        named_type(p)
    })
}

fn name(p: &mut Parser<'_>) -> Step {
    p.expect_category(Category::Name, NAME)
}

fn starts_name(p: &mut Parser<'_>) -> bool {
    p.check_category(Category::Name, NAME)
}

fn selection_set(p: &mut Parser<'_>) -> Step {
    p.rule("SelectionSet", |p| {
        p.expect("LCurly")?;
        p.one_or_more(starts_selection, selection, &[NAME, "Spread"])?;
        p.expect("RCurly")
    })
}

fn starts_selection(p: &mut Parser<'_>) -> bool {
    starts_name(p) || p.check("Spread")
}

fn selection(p: &mut Parser<'_>) -> Step {
    p.rule("Selection", |p| {
        if !p.check("Spread") {
            return field(p);
        }
        let next = p.peek_nth(1);
        let is_spread = next.is(Category::Name) && next.name() != "On";
        if is_spread {
            p.rule("FragmentSpread", |p| {
                p.bump();
                p.rule("FragmentName", name)?;
                directives(p)
            })
        } else {
            p.rule("InlineFragment", |p| {
                p.bump();
                if p.check("On") {
                    type_condition(p)?;
                }
                directives(p)?;
                selection_set(p)
            })
        }
    })
}

fn field(p: &mut Parser<'_>) -> Step {
    p.rule("Field", |p| {
        if p.peek_nth(1).name() == "Colon" {
            p.rule("Alias", |p| {
                name(p)?;
                p.expect("Colon")
            })?;
        }
        name(p)?;
        if p.check("LParen") {
            arguments(p)?;
        }
        directives(p)?;
        if p.check("LCurly") {
            selection_set(p)?;
        }
        Ok(())
    })
}

fn arguments(p: &mut Parser<'_>) -> Step {
    p.rule("Arguments", |p| {
        p.expect("LParen")?;
        p.one_or_more(starts_name, argument, &[NAME])?;
        p.expect("RParen")
    })
}

fn argument(p: &mut Parser<'_>) -> Step {
    p.rule("Argument", |p| {
        name(p)?;
        p.expect("Colon")?;
        value(p)
    })
}

fn value(p: &mut Parser<'_>) -> Step {
    p.rule("Value", |p| {
        if p.check("Dollar") {
            variable(p)
        } else if p.check_any(&["IntValue", "FloatValue", "StringValue", "BlockStringValue"]) {
            p.bump();
            Ok(())
        } else if p.check_any(&["True", "False"]) {
            p.rule("BooleanValue", |p| {
                p.bump();
                Ok(())
            })
        } else if p.check("Null") {
            p.rule("NullValue", |p| {
                p.bump();
                Ok(())
            })
        } else if p.check("LBracket") {
            p.rule("ListValue", |p| {
                p.bump();
                while !p.check("RBracket") && starts_value(p) {
                    value(p)?;
                }
                p.expect("RBracket")
            })
        } else if p.check("LCurly") {
            p.rule("ObjectValue", |p| {
                p.bump();
                while starts_name(p) {
                    p.rule("ObjectField", |p| {
                        name(p)?;
                        p.expect("Colon")?;
                        value(p)
                    })?;
                }
                p.expect("RCurly")
            })
        } else if starts_name(p) {
            p.rule("EnumValue", name)
        } else {
            p.no_viable_alternative(&[
                "Dollar",
                "IntValue",
                "FloatValue",
                "StringValue",
                "True",
                "False",
                "Null",
                "LBracket",
                "LCurly",
                NAME,
            ])
        }
    })
}

fn starts_value(p: &mut Parser<'_>) -> bool {
    p.check_any(&[
        "Dollar",
        "IntValue",
        "FloatValue",
        "StringValue",
        "BlockStringValue",
        "LBracket",
        "LCurly",
    ]) || starts_name(p)
}

fn variable(p: &mut Parser<'_>) -> Step {
    p.rule("Variable", |p| {
        p.expect("Dollar")?;
        name(p)
    })
}

fn variable_definitions(p: &mut Parser<'_>) -> Step {
    p.rule("VariableDefinitions", |p| {
        p.expect("LParen")?;
        p.one_or_more(|p| p.check("Dollar"), variable_definition, &["Dollar"])?;
        p.expect("RParen")
    })
}

fn variable_definition(p: &mut Parser<'_>) -> Step {
    p.rule("VariableDefinition", |p| {
        variable(p)?;
        p.expect("Colon")?;
        type_reference(p)?;
        if p.check("Equals") {
            p.rule("DefaultValue", |p| {
                p.bump();
                value(p)
            })?;
        }
        directives(p)
    })
}

fn type_reference(p: &mut Parser<'_>) -> Step {
    p.rule("Type", |p| {
        if p.eat("LBracket") {
            type_reference(p)?;
            p.expect("RBracket")?;
        } else {
            named_type(p)?;
        }
        p.eat("Bang");
        Ok(())
    })
}

fn named_type(p: &mut Parser<'_>) -> Step {
    p.rule("NamedType", name)
}

fn starts_directive(p: &mut Parser<'_>) -> bool {
    p.check("At") || p.check_category(Category::Directive, STARDOG_DIRECTIVE)
}

fn directives(p: &mut Parser<'_>) -> Step {
    if !starts_directive(p) {
        return Ok(());
    }
    p.rule("Directives", |p| {
        while starts_directive(p) {
            p.rule("Directive", |p| {
                if p.eat("At") {
                    name(p)?;
                } else {
                    p.bump();
                }
                if p.check("LParen") {
                    arguments(p)?;
                }
                Ok(())
            })?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stardog_analysis::grammar::SyntaxErrorKind;
    use stardog_analysis::hover::hover;

    fn parse(dialect: GraphQlDialect, text: &str) -> ParseOutput {
        GraphQlGrammar::new(dialect).parse(text)
    }

    fn assist(dialect: GraphQlDialect, text: &str) -> Vec<String> {
        let grammar = GraphQlGrammar::new(dialect);
        let tokens = grammar.tokenize(text);
        grammar
            .content_assist(ENTRY_RULE, &tokens)
            .into_iter()
            .map(|candidate| candidate.next_token_type.name.clone())
            .collect()
    }

    #[test]
    fn accepts_executable_documents() {
        for text in [
            "{ Human { name } }",
            "query Hero($episode: Episode = JEDI, $ids: [ID!]!) { hero(episode: $episode) { name, ...Parts friends @skip(if: true) { name } } }",
            "fragment Parts on Character { id ... on Droid { primaryFunction } }",
            "mutation { like(input: { id: 1, tags: [\"a\" \"b\"], score: 1.5e2 }) { query } }",
            "{ Human @optional { name @filter(if: \"$name != 'x'\") } }",
        ] {
            let output = parse(GraphQlDialect::Stardog, text);
            assert!(output.errors.is_empty(), "{text}: {:?}", output.errors);
        }
    }

    #[test]
    fn unclosed_selection_set() {
        let output = parse(GraphQlDialect::Stardog, "{ Human { name");
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].message, "'}' expected.");
        assert_eq!(output.errors[0].innermost_rule(), Some("SelectionSet"));
        assert!(output.errors[0].token.is_end_of_input());
    }

    #[test]
    fn hovering_a_field_name_reports_the_field() {
        let output = parse(GraphQlDialect::Stardog, "{ Human { name");
        assert_eq!(hover(&output.cst, 3).unwrap().rule, "Field");
    }

    #[test]
    fn empty_selection_set_is_an_early_exit() {
        let output = parse(GraphQlDialect::Standard, "{ }");
        assert_eq!(output.errors[0].kind, SyntaxErrorKind::EarlyExit);
        assert_eq!(
            output.errors[0].previous_token.as_ref().map(|t| t.image.as_str()),
            Some("{")
        );
    }

    #[test]
    fn stardog_directives_are_dialect_specific() {
        let stardog = GraphQlGrammar::new(GraphQlDialect::Stardog).tokenize("@optional");
        assert_eq!(stardog[0].name(), "OptionalDirective");
        let standard = GraphQlGrammar::new(GraphQlDialect::Standard).tokenize("@optional");
        assert_eq!(standard[0].name(), "At");
        // plain directives still parse in the standard dialect
        assert!(parse(GraphQlDialect::Standard, "{ a @optional }").errors.is_empty());
    }

    #[test]
    fn assist_offers_keywords_and_directives() {
        let names = assist(GraphQlDialect::Stardog, "");
        assert!(names.contains(&"Query".to_string()));
        assert!(names.contains(&"Fragment".to_string()));

        let names = assist(GraphQlDialect::Stardog, "{ Human ");
        assert!(names.contains(&STARDOG_DIRECTIVE.to_string()));
        assert!(names.contains(&NAME.to_string()));

        let names = assist(GraphQlDialect::Standard, "{ Human ");
        assert!(!names.contains(&STARDOG_DIRECTIVE.to_string()));
    }

    #[test]
    fn commas_are_insignificant() {
        let tokens = GraphQlGrammar::new(GraphQlDialect::Standard).tokenize("a, b,,c");
        assert_eq!(tokens.len(), 3);
    }
}
