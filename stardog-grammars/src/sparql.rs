//! SPARQL 1.1 query and update, with Stardog's path queries.
//!
//! Rule names follow the W3C grammar (`SelectClause`, `GroupGraphPattern`,
//! `PathPrimary`, ...) since editors surface them in hovers and diagnostic
//! sources. The Stardog dialect adds `PATHS` queries; the W3 dialect lacks
//! those keywords entirely, so their productions never match.
//!
//! Codepoint escapes are decoded before lexing and reported through the
//! parse output's escape map.

use std::sync::Arc;

use regex::Regex;
use stardog_analysis::escapes::{unescape_codepoints, Unescaped};
use stardog_analysis::grammar::{CompletionCandidate, Grammar, ParseOutput};
use stardog_analysis::token::{Category, Token, TokenType};

use crate::lexer::{pattern, Lexer, Vocabulary};
use crate::parser::{assist_tokens, parse_tokens, Parser, Step};
use crate::rdf::{self, *};

pub const ENTRY_RULE: &str = "SparqlDoc";

pub const VAR1: &str = "VAR1";
pub const VAR2: &str = "VAR2";
pub const NIL: &str = "NIL";
pub const BUILT_IN_CALL: &str = "BuiltInCall";

const VARS: [&str; 2] = [VAR1, VAR2];

const BUILT_INS: &[&str] = &[
    "str", "lang", "langmatches", "datatype", "bound", "iri", "uri", "bnode", "rand", "abs",
    "ceil", "floor", "round", "concat", "strlen", "ucase", "lcase", "encode_for_uri",
    "contains", "strstarts", "strends", "strbefore", "strafter", "year", "month", "day",
    "hours", "minutes", "seconds", "timezone", "tz", "now", "uuid", "struuid", "md5", "sha1",
    "sha256", "sha384", "sha512", "coalesce", "if", "strlang", "strdt", "sameterm", "isiri",
    "isuri", "isblank", "isliteral", "isnumeric", "regex", "substr", "replace",
];

const AGGREGATES: &[&str] = &[
    "COUNT",
    "SUM",
    "MIN",
    "MAX",
    "AVG",
    "SAMPLE",
    "GROUP_CONCAT",
];

const KEYWORDS: &[(&str, &str)] = &[
    ("BASE", "base"),
    ("PREFIX", "prefix"),
    ("SELECT", "select"),
    ("DISTINCT", "distinct"),
    ("REDUCED", "reduced"),
    ("AS", "as"),
    ("CONSTRUCT", "construct"),
    ("DESCRIBE", "describe"),
    ("ASK", "ask"),
    ("WHERE", "where"),
    ("FROM", "from"),
    ("NAMED", "named"),
    ("GROUP_BY", "group by"),
    ("HAVING", "having"),
    ("ORDER_BY", "order by"),
    ("ASC", "asc"),
    ("DESC", "desc"),
    ("LIMIT", "limit"),
    ("OFFSET", "offset"),
    ("VALUES", "values"),
    ("UNDEF", "undef"),
    ("OPTIONAL", "optional"),
    ("MINUS", "minus"),
    ("GRAPH", "graph"),
    ("SERVICE", "service"),
    ("SILENT", "silent"),
    ("BIND", "bind"),
    ("FILTER", "filter"),
    ("UNION", "union"),
    ("EXISTS", "exists"),
    ("NOT_EXISTS", "not exists"),
    ("IN", "in"),
    ("NOT_IN", "not in"),
    ("COUNT", "count"),
    ("SUM", "sum"),
    ("MIN", "min"),
    ("MAX", "max"),
    ("AVG", "avg"),
    ("SAMPLE", "sample"),
    ("GROUP_CONCAT", "group_concat"),
    ("SEPARATOR", "separator"),
    ("LOAD", "load"),
    ("INTO", "into"),
    ("CLEAR", "clear"),
    ("DROP", "drop"),
    ("CREATE", "create"),
    ("ADD", "add"),
    ("MOVE", "move"),
    ("COPY", "copy"),
    ("TO", "to"),
    ("DEFAULT", "default"),
    ("ALL", "all"),
    ("INSERT_DATA", "insert data"),
    ("DELETE_DATA", "delete data"),
    ("DELETE_WHERE", "delete where"),
    ("INSERT", "insert"),
    ("DELETE", "delete"),
    ("WITH", "with"),
    ("USING", "using"),
    (A, "a"),
];

const STARDOG_KEYWORDS: &[(&str, &str)] = &[
    ("PATHS", "paths"),
    ("PATHS_SHORTEST", "paths shortest"),
    ("PATHS_ALL", "paths all"),
    ("CYCLIC", "cyclic"),
    ("START", "start"),
    ("END", "end"),
    ("VIA", "via"),
    ("MAX_LENGTH", "max length"),
];

const OPERATORS: &[(&str, &str)] = &[
    ("Star", "*"),
    ("Equals", "="),
    ("NotEquals", "!="),
    ("LessThanEquals", "<="),
    ("GreaterThanEquals", ">="),
    ("LessThan", "<"),
    ("GreaterThan", ">"),
    ("LogicalOr", "||"),
    ("LogicalAnd", "&&"),
    ("Plus", "+"),
    ("Minus", "-"),
    ("Bang", "!"),
    ("ForwardSlash", "/"),
    ("Pipe", "|"),
    ("Caret", "^"),
    ("QuestionMark", "?"),
];

const COMPARISONS: &[&str] = &[
    "Equals",
    "NotEquals",
    "LessThan",
    "GreaterThan",
    "LessThanEquals",
    "GreaterThanEquals",
];

const QUERY_STARTS: &[&str] = &[
    "SELECT",
    "CONSTRUCT",
    "DESCRIBE",
    "ASK",
    "PATHS",
    "PATHS_SHORTEST",
    "PATHS_ALL",
];

const UPDATE_STARTS: &[&str] = &[
    "LOAD",
    "CLEAR",
    "DROP",
    "CREATE",
    "ADD",
    "MOVE",
    "COPY",
    "INSERT_DATA",
    "DELETE_DATA",
    "DELETE_WHERE",
    "WITH",
    "DELETE",
    "INSERT",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SparqlDialect {
    W3,
    #[default]
    Stardog,
}

impl SparqlDialect {
    /// `"w3"` selects the W3 dialect; anything else is Stardog.
    pub fn from_option(grammar: Option<&str>) -> Self {
        match grammar {
            Some(name) if name.eq_ignore_ascii_case("w3") => SparqlDialect::W3,
            _ => SparqlDialect::Stardog,
        }
    }
}

pub fn vocabulary(dialect: SparqlDialect) -> Vocabulary {
    let mut types = Vec::new();
    let built_ins = BUILT_INS.iter().map(|text| {
        TokenType::keyword(text.to_uppercase(), *text).with_categories(&[Category::BuiltInCall])
    });
    types.extend(built_ins);
    types.extend(
        KEYWORDS
            .iter()
            .map(|(name, text)| TokenType::keyword(*name, *text)),
    );
    if dialect == SparqlDialect::Stardog {
        types.extend(
            STARDOG_KEYWORDS
                .iter()
                .map(|(name, text)| TokenType::keyword(*name, *text)),
        );
    }
    types.push(TokenType::category(BUILT_IN_CALL, Category::BuiltInCall));
    types.push(
        TokenType::regex(VAR1, pattern(r"^\?\w+"))
            .with_categories(&[Category::Variable])
            .with_label("?foo"),
    );
    types.push(
        TokenType::regex(VAR2, pattern(r"^\$\w+"))
            .with_categories(&[Category::Variable])
            .with_label("$foo"),
    );
    types.push(TokenType::regex(NIL, pattern(r"^\([ \t\r\n]*\)")));
    types.extend(rdf::terms(false));
    types.extend(rdf::punctuation());
    types.extend(OPERATORS.iter().map(|(name, text)| {
        TokenType::literal(*name, *text).with_categories(&[Category::Punctuator])
    }));
    Vocabulary::new(types)
}

fn skipped() -> Vec<Regex> {
    vec![pattern(r"^\s+"), pattern(r"^#[^\r\n]*")]
}

pub struct SparqlGrammar {
    dialect: SparqlDialect,
    vocabulary: Vocabulary,
    lexer: Lexer,
}

impl SparqlGrammar {
    pub fn new(dialect: SparqlDialect) -> Self {
        let vocabulary = vocabulary(dialect);
        let lexer = Lexer::new(&vocabulary, skipped());
        Self {
            dialect,
            vocabulary,
            lexer,
        }
    }

    pub fn dialect(&self) -> SparqlDialect {
        self.dialect
    }

    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        self.lexer.tokenize(text)
    }
}

impl Grammar for SparqlGrammar {
    fn parse(&self, text: &str) -> ParseOutput {
        let Unescaped {
            text: unescaped,
            escapes,
        } = unescape_codepoints(text);
        let tokens = self.lexer.tokenize(&unescaped);
        let (cst, errors) =
            parse_tokens(&self.vocabulary, &tokens, unescaped.len(), ENTRY_RULE, document);
        tracing::trace!(tokens = tokens.len(), errors = errors.len(), "parsed sparql");
        ParseOutput {
            cst,
            tokens,
            errors,
            semantic_errors: Vec::new(),
            escapes: (!escapes.is_empty()).then_some(escapes),
        }
    }

    fn content_assist(&self, start_rule: &str, tokens: &[Token]) -> Vec<CompletionCandidate> {
        assist_tokens(&self.vocabulary, tokens, start_rule, document)
    }

    fn vocabulary(&self) -> &[Arc<TokenType>] {
        self.vocabulary.types()
    }
}

// ---------------------------------------------------------------------------
// Document structure

fn document(p: &mut Parser<'_>) -> Step {
    prologue(p)?;
    if p.check_any(QUERY_STARTS) {
        query(p)?;
        values_clause(p)
    } else {
        update(p)
    }
}

fn prologue(p: &mut Parser<'_>) -> Step {
    p.rule("Prologue", |p| loop {
        if p.check("BASE") {
            p.rule("BaseDecl", |p| {
                p.bump();
                p.expect(IRIREF)
            })?;
        } else if p.check("PREFIX") {
            p.rule("PrefixDecl", |p| {
                p.bump();
                p.expect(PNAME_NS)?;
                p.expect(IRIREF)
            })?;
        } else {
            return Ok(());
        }
    })
}

fn query(p: &mut Parser<'_>) -> Step {
    if p.check("SELECT") {
        select_query(p)
    } else if p.check("CONSTRUCT") {
        construct_query(p)
    } else if p.check("DESCRIBE") {
        describe_query(p)
    } else if p.check("ASK") {
        ask_query(p)
    } else {
        path_query(p)
    }
}

fn select_query(p: &mut Parser<'_>) -> Step {
    p.rule("SelectQuery", |p| {
        select_clause(p)?;
        dataset_clauses(p)?;
        where_clause(p)?;
        solution_modifier(p)
    })
}

fn sub_select(p: &mut Parser<'_>) -> Step {
    p.rule("SubSelect", |p| {
        select_clause(p)?;
        where_clause(p)?;
        solution_modifier(p)?;
        values_clause(p)
    })
}

fn select_clause(p: &mut Parser<'_>) -> Step {
    p.rule("SelectClause", |p| {
        p.expect("SELECT")?;
        let _ = p.eat("DISTINCT") || p.eat("REDUCED");
        if p.eat("Star") {
            return Ok(());
        }
        let mut projected = 0;
        loop {
            if p.check_any(&VARS) {
                var(p)?;
            } else if p.eat(LPAREN) {
                expression(p)?;
                p.expect("AS")?;
                var(p)?;
                p.expect(RPAREN)?;
            } else if projected == 0 {
                return p.early_exit(&[VAR1, VAR2, LPAREN, "Star"]);
            } else {
                return Ok(());
            }
            projected += 1;
        }
    })
}

fn construct_query(p: &mut Parser<'_>) -> Step {
    p.rule("ConstructQuery", |p| {
        p.expect("CONSTRUCT")?;
        if p.check(LCURLY) {
            p.rule("ConstructTemplate", |p| {
                p.bump();
                if starts_triples(p) {
                    triples_list(p, "ConstructTriples")?;
                }
                p.expect(RCURLY)
            })?;
            dataset_clauses(p)?;
            where_clause(p)?;
        } else {
            dataset_clauses(p)?;
            p.expect("WHERE")?;
            p.expect(LCURLY)?;
            if starts_triples(p) {
                triples_list(p, "TriplesTemplate")?;
            }
            p.expect(RCURLY)?;
        }
        solution_modifier(p)
    })
}

fn describe_query(p: &mut Parser<'_>) -> Step {
    p.rule("DescribeQuery", |p| {
        p.expect("DESCRIBE")?;
        if !p.eat("Star") {
            if !starts_var_or_iri(p) {
                return p.early_exit(&[VAR1, VAR2, IRIREF, PNAME_LN, PNAME_NS, "Star"]);
            }
            while starts_var_or_iri(p) {
                var_or_iri(p)?;
            }
        }
        dataset_clauses(p)?;
        if p.check("WHERE") || p.check(LCURLY) {
            where_clause(p)?;
        }
        solution_modifier(p)
    })
}

fn ask_query(p: &mut Parser<'_>) -> Step {
    p.rule("AskQuery", |p| {
        p.expect("ASK")?;
        dataset_clauses(p)?;
        where_clause(p)?;
        solution_modifier(p)
    })
}

/// `PATHS [SHORTEST|ALL] [CYCLIC] START ?s [= term] END ?e [= term] VIA ...`
fn path_query(p: &mut Parser<'_>) -> Step {
    p.rule("PathQuery", |p| {
        if !p.check_any(&["PATHS", "PATHS_SHORTEST", "PATHS_ALL"]) {
            return p.no_viable_alternative(&["PATHS", "PATHS_SHORTEST", "PATHS_ALL"]);
        }
        p.bump();
        p.eat("CYCLIC");
        dataset_clauses(p)?;
        p.expect("START")?;
        path_terminal(p)?;
        p.expect("END")?;
        path_terminal(p)?;
        p.expect("VIA")?;
        if p.check(LCURLY) {
            group_graph_pattern(p)?;
        } else if p.check_any(&VARS) {
            var(p)?;
        } else {
            path(p)?;
        }
        if p.eat("MAX_LENGTH") {
            p.expect(INTEGER)?;
        }
        solution_modifier(p)
    })
}

fn path_terminal(p: &mut Parser<'_>) -> Step {
    p.rule("PathTerminal", |p| {
        var(p)?;
        if p.eat("Equals") {
            if p.check(LCURLY) {
                group_graph_pattern(p)?;
            } else {
                iri(p)?;
            }
        }
        Ok(())
    })
}

fn dataset_clauses(p: &mut Parser<'_>) -> Step {
    while p.check("FROM") {
        p.rule("DatasetClause", |p| {
            p.bump();
            if p.check("NAMED") {
                p.rule("NamedGraphClause", |p| {
                    p.bump();
                    iri(p)
                })
            } else {
                p.rule("DefaultGraphClause", iri)
            }
        })?;
    }
    Ok(())
}

fn where_clause(p: &mut Parser<'_>) -> Step {
    p.rule("WhereClause", |p| {
        p.eat("WHERE");
        group_graph_pattern(p)
    })
}

fn solution_modifier(p: &mut Parser<'_>) -> Step {
    p.rule("SolutionModifier", |p| {
        if p.check("GROUP_BY") {
            p.rule("GroupClause", |p| {
                p.bump();
                p.one_or_more(starts_group_condition, group_condition, GROUP_CONDITION_STARTS)
            })?;
        }
        if p.check("HAVING") {
            p.rule("HavingClause", |p| {
                p.bump();
                p.one_or_more(starts_constraint, constraint, CONSTRAINT_STARTS)
            })?;
        }
        if p.check("ORDER_BY") {
            p.rule("OrderClause", |p| {
                p.bump();
                p.one_or_more(starts_order_condition, order_condition, ORDER_CONDITION_STARTS)
            })?;
        }
        if p.check("LIMIT") || p.check("OFFSET") {
            p.rule("LimitOffsetClauses", |p| {
                if p.check("LIMIT") {
                    limit_clause(p)?;
                    if p.check("OFFSET") {
                        offset_clause(p)?;
                    }
                } else {
                    offset_clause(p)?;
                    if p.check("LIMIT") {
                        limit_clause(p)?;
                    }
                }
                Ok(())
            })?;
        }
        Ok(())
    })
}

fn limit_clause(p: &mut Parser<'_>) -> Step {
    p.rule("LimitClause", |p| {
        p.bump();
        p.expect(INTEGER)
    })
}

fn offset_clause(p: &mut Parser<'_>) -> Step {
    p.rule("OffsetClause", |p| {
        p.bump();
        p.expect(INTEGER)
    })
}

const GROUP_CONDITION_STARTS: &[&str] = &[BUILT_IN_CALL, IRIREF, PNAME_LN, PNAME_NS, LPAREN, VAR1, VAR2];
const CONSTRAINT_STARTS: &[&str] = &[LPAREN, BUILT_IN_CALL, IRIREF, PNAME_LN, PNAME_NS];
const ORDER_CONDITION_STARTS: &[&str] = &[
    "ASC",
    "DESC",
    VAR1,
    VAR2,
    LPAREN,
    BUILT_IN_CALL,
    IRIREF,
    PNAME_LN,
    PNAME_NS,
];

fn starts_group_condition(p: &mut Parser<'_>) -> bool {
    starts_built_in_call(p) || rdf::starts_iri(p) || p.check(LPAREN) || p.check_any(&VARS)
}

fn group_condition(p: &mut Parser<'_>) -> Step {
    p.rule("GroupCondition", |p| {
        if starts_built_in_call(p) {
            built_in_call(p)
        } else if rdf::starts_iri(p) {
            function_call(p)
        } else if p.eat(LPAREN) {
            expression(p)?;
            if p.eat("AS") {
                var(p)?;
            }
            p.expect(RPAREN)
        } else {
            var(p)
        }
    })
}

fn starts_order_condition(p: &mut Parser<'_>) -> bool {
    p.check_any(&["ASC", "DESC"]) || p.check_any(&VARS) || starts_constraint(p)
}

fn order_condition(p: &mut Parser<'_>) -> Step {
    p.rule("OrderCondition", |p| {
        if p.check_any(&["ASC", "DESC"]) {
            p.bump();
            bracketted_expression(p)
        } else if p.check_any(&VARS) {
            var(p)
        } else {
            constraint(p)
        }
    })
}

fn values_clause(p: &mut Parser<'_>) -> Step {
    if p.check("VALUES") {
        p.rule("ValuesClause", |p| {
            p.bump();
            data_block(p)
        })?;
    }
    Ok(())
}

fn data_block(p: &mut Parser<'_>) -> Step {
    p.rule("DataBlock", |p| {
        if p.check_any(&VARS) {
            p.rule("InlineDataOneVar", |p| {
                var(p)?;
                p.expect(LCURLY)?;
                while starts_data_block_value(p) {
                    data_block_value(p)?;
                }
                p.expect(RCURLY)
            })
        } else if p.check(NIL) || p.check(LPAREN) {
            p.rule("InlineDataFull", |p| {
                if !p.eat(NIL) {
                    p.expect(LPAREN)?;
                    while p.check_any(&VARS) {
                        var(p)?;
                    }
                    p.expect(RPAREN)?;
                }
                p.expect(LCURLY)?;
                loop {
                    if p.eat(NIL) {
                        continue;
                    }
                    if !p.eat(LPAREN) {
                        break;
                    }
                    while starts_data_block_value(p) {
                        data_block_value(p)?;
                    }
                    p.expect(RPAREN)?;
                }
                p.expect(RCURLY)
            })
        } else {
            p.no_viable_alternative(&[VAR1, VAR2, NIL, LPAREN])
        }
    })
}

fn starts_data_block_value(p: &mut Parser<'_>) -> bool {
    rdf::starts_iri(p) || rdf::starts_literal(p) || p.check("UNDEF")
}

fn data_block_value(p: &mut Parser<'_>) -> Step {
    p.rule("DataBlockValue", |p| {
        if rdf::starts_iri(p) {
            iri(p)
        } else if p.eat("UNDEF") {
            Ok(())
        } else {
            rdf::literal(p)
        }
    })
}

// ---------------------------------------------------------------------------
// Graph patterns

fn group_graph_pattern(p: &mut Parser<'_>) -> Step {
    p.rule("GroupGraphPattern", |p| {
        p.expect(LCURLY)?;
        if p.check("SELECT") {
            sub_select(p)?;
        } else {
            group_graph_pattern_sub(p)?;
        }
        p.expect(RCURLY)
    })
}

fn group_graph_pattern_sub(p: &mut Parser<'_>) -> Step {
    p.rule("GroupGraphPatternSub", |p| {
        if starts_triples(p) {
            triples_block(p)?;
        }
        while starts_graph_pattern_not_triples(p) {
            graph_pattern_not_triples(p)?;
            p.eat(PERIOD);
            if starts_triples(p) {
                triples_block(p)?;
            }
        }
        Ok(())
    })
}

fn triples_block(p: &mut Parser<'_>) -> Step {
    p.rule("TriplesBlock", |p| loop {
        triples_same_subject(p, true)?;
        if !p.eat(PERIOD) || !starts_triples(p) {
            return Ok(());
        }
    })
}

/// Period-separated triples under a rule named `name`.
fn triples_list(p: &mut Parser<'_>, name: &str) -> Step {
    p.rule(name, |p| loop {
        triples_same_subject(p, false)?;
        if !p.eat(PERIOD) || !starts_triples(p) {
            return Ok(());
        }
    })
}

fn starts_graph_pattern_not_triples(p: &mut Parser<'_>) -> bool {
    p.check_any(&[
        LCURLY, "OPTIONAL", "MINUS", "GRAPH", "SERVICE", "FILTER", "BIND", "VALUES",
    ])
}

fn graph_pattern_not_triples(p: &mut Parser<'_>) -> Step {
    if p.check("FILTER") {
        return p.rule("Filter", |p| {
            p.bump();
            constraint(p)
        });
    }
    p.rule("GraphPatternNotTriples", |p| {
        if p.check(LCURLY) {
            p.rule("GroupOrUnionGraphPattern", |p| {
                group_graph_pattern(p)?;
                while p.eat("UNION") {
                    group_graph_pattern(p)?;
                }
                Ok(())
            })
        } else if p.check("OPTIONAL") {
            p.rule("OptionalGraphPattern", |p| {
                p.bump();
                group_graph_pattern(p)
            })
        } else if p.check("MINUS") {
            p.rule("MinusGraphPattern", |p| {
                p.bump();
                group_graph_pattern(p)
            })
        } else if p.check("GRAPH") {
            p.rule("GraphGraphPattern", |p| {
                p.bump();
                var_or_iri(p)?;
                group_graph_pattern(p)
            })
        } else if p.check("SERVICE") {
            p.rule("ServiceGraphPattern", |p| {
                p.bump();
                p.eat("SILENT");
                var_or_iri(p)?;
                group_graph_pattern(p)
            })
        } else if p.check("BIND") {
            p.rule("Bind", |p| {
                p.bump();
                p.expect(LPAREN)?;
                expression(p)?;
                p.expect("AS")?;
                var(p)?;
                p.expect(RPAREN)
            })
        } else {
            p.rule("InlineData", |p| {
                p.expect("VALUES")?;
                data_block(p)
            })
        }
    })
}

// ---------------------------------------------------------------------------
// Triples

fn starts_triples(p: &mut Parser<'_>) -> bool {
    starts_var_or_term(p) || p.check(LPAREN) || p.check(LBRACKET)
}

fn starts_var_or_term(p: &mut Parser<'_>) -> bool {
    p.check_any(&VARS)
        || rdf::starts_iri(p)
        || rdf::starts_literal(p)
        || rdf::starts_blank_node(p)
        || p.check(NIL)
}

fn starts_var_or_iri(p: &mut Parser<'_>) -> bool {
    p.check_any(&VARS) || rdf::starts_iri(p)
}

/// Subject and property list. `paths` selects the property-path forms used
/// in graph patterns over the plain forms used in templates.
fn triples_same_subject(p: &mut Parser<'_>, paths: bool) -> Step {
    let name = if paths {
        "TriplesSameSubjectPath"
    } else {
        "TriplesSameSubject"
    };
    p.rule(name, |p| {
        if p.check(LPAREN) || p.check(LBRACKET) {
            triples_node(p, paths)?;
            if starts_verb(p, paths) {
                property_list_not_empty(p, paths)?;
            }
            Ok(())
        } else {
            var_or_term(p)?;
            property_list_not_empty(p, paths)
        }
    })
}

fn starts_verb(p: &mut Parser<'_>, paths: bool) -> bool {
    let simple = p.check_any(&VARS) || rdf::starts_iri(p) || p.check(A);
    simple || (paths && p.check_any(&["Caret", LPAREN, "Bang"]))
}

fn property_list_not_empty(p: &mut Parser<'_>, paths: bool) -> Step {
    let name = if paths {
        "PropertyListPathNotEmpty"
    } else {
        "PropertyListNotEmpty"
    };
    p.rule(name, |p| {
        verb(p, paths)?;
        object_list(p, paths)?;
        while p.eat(SEMICOLON) {
            if starts_verb(p, paths) {
                verb(p, paths)?;
                object_list(p, paths)?;
            }
        }
        Ok(())
    })
}

fn verb(p: &mut Parser<'_>, paths: bool) -> Step {
    if !paths {
        return p.rule("Verb", |p| {
            if p.check_any(&VARS) {
                var(p)
            } else if p.eat(A) {
                Ok(())
            } else {
                iri(p)
            }
        });
    }
    if p.check_any(&VARS) {
        p.rule("VerbSimple", var)
    } else {
        p.rule("VerbPath", path)
    }
}

fn object_list(p: &mut Parser<'_>, paths: bool) -> Step {
    let (list, object) = if paths {
        ("ObjectListPath", "ObjectPath")
    } else {
        ("ObjectList", "Object")
    };
    p.rule(list, |p| loop {
        p.rule(object, |p| graph_node(p, paths))?;
        if !p.eat(COMMA) {
            return Ok(());
        }
    })
}

fn graph_node(p: &mut Parser<'_>, paths: bool) -> Step {
    let name = if paths { "GraphNodePath" } else { "GraphNode" };
    p.rule(name, |p| {
        if p.check(LPAREN) || p.check(LBRACKET) {
            triples_node(p, paths)
        } else {
            var_or_term(p)
        }
    })
}

fn triples_node(p: &mut Parser<'_>, paths: bool) -> Step {
    let (node, collection, property_list) = if paths {
        ("TriplesNodePath", "CollectionPath", "BlankNodePropertyListPath")
    } else {
        ("TriplesNode", "Collection", "BlankNodePropertyList")
    };
    p.rule(node, |p| {
        if p.check(LPAREN) {
            p.rule(collection, |p| {
                p.bump();
                loop {
                    graph_node(p, paths)?;
                    if !(starts_var_or_term(p) || p.check(LPAREN) || p.check(LBRACKET)) {
                        break;
                    }
                }
                p.expect(RPAREN)
            })
        } else {
            p.rule(property_list, |p| {
                p.expect(LBRACKET)?;
                property_list_not_empty(p, paths)?;
                p.expect(RBRACKET)
            })
        }
    })
}

fn var_or_term(p: &mut Parser<'_>) -> Step {
    p.rule("VarOrTerm", |p| {
        if p.check_any(&VARS) {
            var(p)
        } else {
            p.rule("GraphTerm", |p| {
                if rdf::starts_iri(p) {
                    iri(p)
                } else if rdf::starts_literal(p) {
                    rdf::literal(p)
                } else if rdf::starts_blank_node(p) {
                    rdf::blank_node(p)
                } else if p.eat(NIL) {
                    Ok(())
                } else {
                    let mut expected = vec![VAR1, VAR2, IRIREF, PNAME_LN, PNAME_NS];
                    expected.extend(STRINGS);
                    expected.extend(NUMBERS);
                    expected.extend([TRUE, FALSE, BLANK_NODE_LABEL, ANON, NIL]);
                    p.no_viable_alternative(&expected)
                }
            })
        }
    })
}

fn var_or_iri(p: &mut Parser<'_>) -> Step {
    p.rule("VarOrIri", |p| {
        if p.check_any(&VARS) {
            var(p)
        } else {
            iri(p)
        }
    })
}

fn var(p: &mut Parser<'_>) -> Step {
    p.rule("Var", |p| {
        if p.eat(VAR1) || p.eat(VAR2) {
            Ok(())
        } else {
            p.no_viable_alternative(&VARS)
        }
    })
}

// ---------------------------------------------------------------------------
// Property paths

fn path(p: &mut Parser<'_>) -> Step {
    p.rule("Path", |p| {
        p.rule("PathAlternative", |p| {
            path_sequence(p)?;
            while p.eat("Pipe") {
                path_sequence(p)?;
            }
            Ok(())
        })
    })
}

fn path_sequence(p: &mut Parser<'_>) -> Step {
    p.rule("PathSequence", |p| {
        path_elt_or_inverse(p)?;
        while p.eat("ForwardSlash") {
            path_elt_or_inverse(p)?;
        }
        Ok(())
    })
}

fn path_elt_or_inverse(p: &mut Parser<'_>) -> Step {
    p.rule("PathEltOrInverse", |p| {
        p.eat("Caret");
        p.rule("PathElt", |p| {
            path_primary(p)?;
            if p.check_any(&["QuestionMark", "Star", "Plus"]) {
                p.rule("PathMod", |p| {
                    p.bump();
                    Ok(())
                })?;
            }
            Ok(())
        })
    })
}

fn path_primary(p: &mut Parser<'_>) -> Step {
    p.rule("PathPrimary", |p| {
        if rdf::starts_iri(p) {
            iri(p)
        } else if p.eat(A) {
            Ok(())
        } else if p.eat("Bang") {
            path_negated_property_set(p)
        } else if p.eat(LPAREN) {
            path(p)?;
            p.expect(RPAREN)
        } else {
            p.no_viable_alternative(&[IRIREF, PNAME_LN, PNAME_NS, A, "Bang", LPAREN])
        }
    })
}

fn path_negated_property_set(p: &mut Parser<'_>) -> Step {
    p.rule("PathNegatedPropertySet", |p| {
        if !p.eat(LPAREN) {
            return path_one_in_property_set(p);
        }
        if !p.check(RPAREN) {
            path_one_in_property_set(p)?;
            while p.eat("Pipe") {
                path_one_in_property_set(p)?;
            }
        }
        p.expect(RPAREN)
    })
}

fn path_one_in_property_set(p: &mut Parser<'_>) -> Step {
    p.rule("PathOneInPropertySet", |p| {
        p.eat("Caret");
        if rdf::starts_iri(p) {
            iri(p)
        } else if p.eat(A) {
            Ok(())
        } else {
            p.no_viable_alternative(&[IRIREF, PNAME_LN, PNAME_NS, A])
        }
    })
}

// ---------------------------------------------------------------------------
// Expressions

fn starts_constraint(p: &mut Parser<'_>) -> bool {
    p.check(LPAREN) || starts_built_in_call(p) || rdf::starts_iri(p)
}

fn constraint(p: &mut Parser<'_>) -> Step {
    p.rule("Constraint", |p| {
        if p.check(LPAREN) {
            bracketted_expression(p)
        } else if starts_built_in_call(p) {
            built_in_call(p)
        } else if rdf::starts_iri(p) {
            function_call(p)
        } else {
            p.no_viable_alternative(CONSTRAINT_STARTS)
        }
    })
}

fn bracketted_expression(p: &mut Parser<'_>) -> Step {
    p.rule("BrackettedExpression", |p| {
        p.expect(LPAREN)?;
        expression(p)?;
        p.expect(RPAREN)
    })
}

fn function_call(p: &mut Parser<'_>) -> Step {
    p.rule("FunctionCall", |p| {
        iri(p)?;
        arg_list(p)
    })
}

fn arg_list(p: &mut Parser<'_>) -> Step {
    p.rule("ArgList", |p| {
        if p.eat(NIL) {
            return Ok(());
        }
        p.expect(LPAREN)?;
        p.eat("DISTINCT");
        expression(p)?;
        while p.eat(COMMA) {
            expression(p)?;
        }
        p.expect(RPAREN)
    })
}

fn expression_list(p: &mut Parser<'_>) -> Step {
    p.rule("ExpressionList", |p| {
        if p.eat(NIL) {
            return Ok(());
        }
        p.expect(LPAREN)?;
        expression(p)?;
        while p.eat(COMMA) {
            expression(p)?;
        }
        p.expect(RPAREN)
    })
}

fn expression(p: &mut Parser<'_>) -> Step {
    p.rule("Expression", |p| {
        p.rule("ConditionalOrExpression", |p| {
            conditional_and(p)?;
            while p.eat("LogicalOr") {
                conditional_and(p)?;
            }
            Ok(())
        })
    })
}

fn conditional_and(p: &mut Parser<'_>) -> Step {
    p.rule("ConditionalAndExpression", |p| {
        value_logical(p)?;
        while p.eat("LogicalAnd") {
            value_logical(p)?;
        }
        Ok(())
    })
}

fn value_logical(p: &mut Parser<'_>) -> Step {
    p.rule("ValueLogical", |p| {
        p.rule("RelationalExpression", |p| {
            numeric_expression(p)?;
            if p.check_any(COMPARISONS) {
                p.bump();
                numeric_expression(p)?;
            } else if p.eat("IN") || p.eat("NOT_IN") {
                expression_list(p)?;
            }
            Ok(())
        })
    })
}

fn numeric_expression(p: &mut Parser<'_>) -> Step {
    p.rule("NumericExpression", |p| {
        p.rule("AdditiveExpression", |p| {
            multiplicative(p)?;
            while p.check_any(&["Plus", "Minus"]) {
                p.bump();
                multiplicative(p)?;
            }
            Ok(())
        })
    })
}

fn multiplicative(p: &mut Parser<'_>) -> Step {
    p.rule("MultiplicativeExpression", |p| {
        unary(p)?;
        while p.check_any(&["Star", "ForwardSlash"]) {
            p.bump();
            unary(p)?;
        }
        Ok(())
    })
}

fn unary(p: &mut Parser<'_>) -> Step {
    p.rule("UnaryExpression", |p| {
        if p.check_any(&["Bang", "Plus", "Minus"]) {
            p.bump();
        }
        primary_expression(p)
    })
}

fn primary_expression(p: &mut Parser<'_>) -> Step {
    p.rule("PrimaryExpression", |p| {
        if p.check(LPAREN) {
            bracketted_expression(p)
        } else if starts_built_in_call(p) {
            built_in_call(p)
        } else if rdf::starts_iri(p) {
            p.rule("iriOrFunction", |p| {
                iri(p)?;
                if p.check(NIL) || p.check(LPAREN) {
                    arg_list(p)?;
                }
                Ok(())
            })
        } else if rdf::starts_literal(p) {
            rdf::literal(p)
        } else if p.check_any(&VARS) {
            var(p)
        } else {
            let mut expected = vec![LPAREN, BUILT_IN_CALL, IRIREF, PNAME_LN, PNAME_NS];
            expected.extend(STRINGS);
            expected.extend(NUMBERS);
            expected.extend([TRUE, FALSE, VAR1, VAR2]);
            p.no_viable_alternative(&expected)
        }
    })
}

fn starts_built_in_call(p: &mut Parser<'_>) -> bool {
    p.check_category(Category::BuiltInCall, BUILT_IN_CALL)
        || p.check_any(AGGREGATES)
        || p.check_any(&["EXISTS", "NOT_EXISTS"])
}

fn built_in_call(p: &mut Parser<'_>) -> Step {
    p.rule("BuiltInCall", |p| {
        if p.check_any(AGGREGATES) {
            aggregate(p)
        } else if p.check("EXISTS") {
            p.rule("ExistsFunc", |p| {
                p.bump();
                group_graph_pattern(p)
            })
        } else if p.check("NOT_EXISTS") {
            p.rule("NotExistsFunc", |p| {
                p.bump();
                group_graph_pattern(p)
            })
        } else if p.eat_category(Category::BuiltInCall, BUILT_IN_CALL) {
            if p.eat(NIL) {
                return Ok(());
            }
            p.expect(LPAREN)?;
            if !p.check(RPAREN) {
                expression(p)?;
                while p.eat(COMMA) {
                    expression(p)?;
                }
            }
            p.expect(RPAREN)
        } else {
            p.no_viable_alternative(&[BUILT_IN_CALL, "EXISTS", "NOT_EXISTS"])
        }
    })
}

fn aggregate(p: &mut Parser<'_>) -> Step {
    p.rule("Aggregate", |p| {
        let function = p.peek().name().to_string();
        p.bump();
        p.expect(LPAREN)?;
        p.eat("DISTINCT");
        if function == "COUNT" && p.eat("Star") {
            return p.expect(RPAREN);
        }
        expression(p)?;
        if function == "GROUP_CONCAT" && p.eat(SEMICOLON) {
            p.expect("SEPARATOR")?;
            p.expect("Equals")?;
            p.rule("String", |p| {
                if p.check_any(&STRINGS) {
                    p.bump();
                    Ok(())
                } else {
                    p.no_viable_alternative(&STRINGS)
                }
            })?;
        }
        p.expect(RPAREN)
    })
}

// ---------------------------------------------------------------------------
// Update

fn update(p: &mut Parser<'_>) -> Step {
    p.rule("Update", |p| loop {
        if !p.check_any(UPDATE_STARTS) {
            return Ok(());
        }
        update1(p)?;
        if !p.eat(SEMICOLON) {
            return Ok(());
        }
        prologue(p)?;
    })
}

fn update1(p: &mut Parser<'_>) -> Step {
    p.rule("Update1", |p| {
        if p.check("LOAD") {
            p.rule("Load", |p| {
                p.bump();
                p.eat("SILENT");
                iri(p)?;
                if p.eat("INTO") {
                    graph_ref(p)?;
                }
                Ok(())
            })
        } else if p.check("CLEAR") || p.check("DROP") {
            let name = if p.check("CLEAR") { "Clear" } else { "Drop" };
            p.rule(name, |p| {
                p.bump();
                p.eat("SILENT");
                graph_ref_all(p)
            })
        } else if p.check("CREATE") {
            p.rule("Create", |p| {
                p.bump();
                p.eat("SILENT");
                graph_ref(p)
            })
        } else if p.check_any(&["ADD", "MOVE", "COPY"]) {
            let name = match p.peek().name() {
                "ADD" => "Add",
                "MOVE" => "Move",
                _ => "Copy",
            };
            p.rule(name, |p| {
                p.bump();
                p.eat("SILENT");
                graph_or_default(p)?;
                p.expect("TO")?;
                graph_or_default(p)
            })
        } else if p.check("INSERT_DATA") {
            p.rule("InsertData", |p| {
                p.bump();
                quad_block(p, "QuadData")
            })
        } else if p.check("DELETE_DATA") {
            p.rule("DeleteData", |p| {
                p.bump();
                quad_block(p, "QuadData")
            })
        } else if p.check("DELETE_WHERE") {
            p.rule("DeleteWhere", |p| {
                p.bump();
                quad_block(p, "QuadPattern")
            })
        } else {
            modify(p)
        }
    })
}

fn modify(p: &mut Parser<'_>) -> Step {
    p.rule("Modify", |p| {
        if p.eat("WITH") {
            iri(p)?;
        }
        if p.check("DELETE") {
            p.rule("DeleteClause", |p| {
                p.bump();
                quad_block(p, "QuadPattern")
            })?;
            if p.check("INSERT") {
                insert_clause(p)?;
            }
        } else {
            insert_clause(p)?;
        }
        while p.check("USING") {
            p.rule("UsingClause", |p| {
                p.bump();
                p.eat("NAMED");
                iri(p)
            })?;
        }
        p.expect("WHERE")?;
        group_graph_pattern(p)
    })
}

fn insert_clause(p: &mut Parser<'_>) -> Step {
    p.rule("InsertClause", |p| {
        p.expect("INSERT")?;
        quad_block(p, "QuadPattern")
    })
}

fn graph_ref(p: &mut Parser<'_>) -> Step {
    p.rule("GraphRef", |p| {
        p.expect("GRAPH")?;
        iri(p)
    })
}

fn graph_ref_all(p: &mut Parser<'_>) -> Step {
    p.rule("GraphRefAll", |p| {
        if p.check("GRAPH") {
            graph_ref(p)
        } else if p.eat("DEFAULT") || p.eat("NAMED") || p.eat("ALL") {
            Ok(())
        } else {
            p.no_viable_alternative(&["GRAPH", "DEFAULT", "NAMED", "ALL"])
        }
    })
}

fn graph_or_default(p: &mut Parser<'_>) -> Step {
    p.rule("GraphOrDefault", |p| {
        if p.eat("DEFAULT") {
            return Ok(());
        }
        p.eat("GRAPH");
        iri(p)
    })
}

fn quad_block(p: &mut Parser<'_>, name: &str) -> Step {
    p.rule(name, |p| {
        p.expect(LCURLY)?;
        p.rule("Quads", |p| {
            if starts_triples(p) {
                triples_list(p, "TriplesTemplate")?;
            }
            while p.check("GRAPH") {
                p.rule("QuadsNotTriples", |p| {
                    p.bump();
                    var_or_iri(p)?;
                    p.expect(LCURLY)?;
                    if starts_triples(p) {
                        triples_list(p, "TriplesTemplate")?;
                    }
                    p.expect(RCURLY)
                })?;
                p.eat(PERIOD);
                if starts_triples(p) {
                    triples_list(p, "TriplesTemplate")?;
                }
            }
            Ok(())
        })?;
        p.expect(RCURLY)
    })
}
