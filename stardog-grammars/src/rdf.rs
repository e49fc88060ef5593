//! RDF terminals and term rules shared by SPARQL, Turtle and TriG.

use stardog_analysis::token::{Category, TokenType};

use crate::lexer::pattern;
use crate::parser::{Parser, Step};

pub const IRIREF: &str = "IRIREF";
pub const PNAME_NS: &str = "PNAME_NS";
pub const PNAME_LN: &str = "PNAME_LN";
pub const BLANK_NODE_LABEL: &str = "BLANK_NODE_LABEL";
pub const ANON: &str = "ANON";
pub const LANGTAG: &str = "LANGTAG";
pub const INTEGER: &str = "INTEGER";
pub const DECIMAL: &str = "DECIMAL";
pub const DOUBLE: &str = "DOUBLE";
pub const TRUE: &str = "TRUE";
pub const FALSE: &str = "FALSE";
pub const STRING_LITERAL1: &str = "STRING_LITERAL1";
pub const STRING_LITERAL2: &str = "STRING_LITERAL2";
pub const STRING_LITERAL_LONG1: &str = "STRING_LITERAL_LONG1";
pub const STRING_LITERAL_LONG2: &str = "STRING_LITERAL_LONG2";

pub const LCURLY: &str = "LCurly";
pub const RCURLY: &str = "RCurly";
pub const LPAREN: &str = "LParen";
pub const RPAREN: &str = "RParen";
pub const LBRACKET: &str = "LBracket";
pub const RBRACKET: &str = "RBracket";
pub const PERIOD: &str = "Period";
pub const SEMICOLON: &str = "Semicolon";
pub const COMMA: &str = "Comma";
pub const DOUBLE_CARET: &str = "DoubleCaret";
/// The `a` shorthand for `rdf:type`.
pub const A: &str = "A";

pub const STRINGS: [&str; 4] = [
    STRING_LITERAL1,
    STRING_LITERAL2,
    STRING_LITERAL_LONG1,
    STRING_LITERAL_LONG2,
];
pub const NUMBERS: [&str; 3] = [INTEGER, DECIMAL, DOUBLE];

const PN_PREFIX: &str = r"(?:\p{L}(?:[\w.-]*[\w-])?)?:";
const PN_LOCAL: &str = r"(?:[\w:]|%[0-9A-Fa-f]{2}|\\[-_~.!$&'()*+,;=/?#@%])(?:(?:[\w.:-]|%[0-9A-Fa-f]{2}|\\[-_~.!$&'()*+,;=/?#@%])*(?:[\w:-]|%[0-9A-Fa-f]{2}|\\[-_~.!$&'()*+,;=/?#@%]))?";

/// Punctuation every RDF syntax uses.
pub fn punctuation() -> Vec<TokenType> {
    [
        (LCURLY, "{"),
        (RCURLY, "}"),
        (LPAREN, "("),
        (RPAREN, ")"),
        (LBRACKET, "["),
        (RBRACKET, "]"),
        (PERIOD, "."),
        (SEMICOLON, ";"),
        (COMMA, ","),
        (DOUBLE_CARET, "^^"),
    ]
    .into_iter()
    .map(|(name, text)| TokenType::literal(name, text).with_categories(&[Category::Punctuator]))
    .collect()
}

/// IRIs, names, blank nodes and literals. Numbers carry their sign when
/// `signed_numbers` is set, as in Turtle; SPARQL treats signs as operators.
pub fn terms(signed_numbers: bool) -> Vec<TokenType> {
    let sign = if signed_numbers { "[+-]?" } else { "" };
    vec![
        TokenType::regex(IRIREF, pattern(r#"^<[^<>"{}|^`\\\x00-\x20]*>"#))
            .with_categories(&[Category::Iri])
            .with_label("<http://example.com>"),
        TokenType::regex(PNAME_LN, pattern(&format!("^{PN_PREFIX}{PN_LOCAL}")))
            .with_categories(&[Category::PrefixedName])
            .with_label("foaf:name"),
        TokenType::regex(PNAME_NS, pattern(&format!("^{PN_PREFIX}")))
            .with_categories(&[Category::PrefixedName])
            .with_label("foaf:"),
        TokenType::regex(BLANK_NODE_LABEL, pattern(r"^_:\w(?:[\w.-]*[\w-])?")),
        TokenType::regex(ANON, pattern(r"^\[[ \t\r\n]*\]")),
        TokenType::regex(LANGTAG, pattern(r"^@[a-zA-Z]+(?:-[a-zA-Z0-9]+)*")),
        TokenType::regex(INTEGER, pattern(&format!("^{sign}[0-9]+")))
            .with_categories(&[Category::Literal]),
        TokenType::regex(DECIMAL, pattern(&format!(r"^{sign}[0-9]*\.[0-9]+")))
            .with_categories(&[Category::Literal]),
        TokenType::regex(
            DOUBLE,
            pattern(&format!(
                r"^{sign}(?:[0-9]+\.[0-9]*[eE][+-]?[0-9]+|\.?[0-9]+[eE][+-]?[0-9]+)"
            )),
        )
        .with_categories(&[Category::Literal]),
        TokenType::keyword(TRUE, "true").with_categories(&[Category::Literal]),
        TokenType::keyword(FALSE, "false").with_categories(&[Category::Literal]),
        TokenType::regex(STRING_LITERAL1, pattern(r"^'(?:[^'\\\n\r]|\\.)*'"))
            .with_categories(&[Category::Literal]),
        TokenType::regex(STRING_LITERAL2, pattern(r#"^"(?:[^"\\\n\r]|\\.)*""#))
            .with_categories(&[Category::Literal]),
        TokenType::regex(
            STRING_LITERAL_LONG1,
            pattern(r"^(?s)'''(?:(?:'|'')?(?:[^'\\]|\\.))*'''"),
        )
        .with_categories(&[Category::Literal]),
        TokenType::regex(
            STRING_LITERAL_LONG2,
            pattern(r#"^(?s)"""(?:(?:"|"")?(?:[^"\\]|\\.))*""""#),
        )
        .with_categories(&[Category::Literal]),
    ]
}

pub fn iri(p: &mut Parser<'_>) -> Step {
    p.rule("iri", |p| {
        if p.eat(IRIREF) {
            return Ok(());
        }
        if p.check_any(&[PNAME_LN, PNAME_NS]) {
            return prefixed_name(p);
        }
        p.no_viable_alternative(&[IRIREF, PNAME_LN, PNAME_NS])
    })
}

pub fn starts_iri(p: &mut Parser<'_>) -> bool {
    p.check_any(&[IRIREF, PNAME_LN, PNAME_NS])
}

pub fn prefixed_name(p: &mut Parser<'_>) -> Step {
    p.rule("PrefixedName", |p| {
        if p.eat(PNAME_LN) || p.eat(PNAME_NS) {
            Ok(())
        } else {
            p.no_viable_alternative(&[PNAME_LN, PNAME_NS])
        }
    })
}

pub fn blank_node(p: &mut Parser<'_>) -> Step {
    p.rule("BlankNode", |p| {
        if p.eat(BLANK_NODE_LABEL) || p.eat(ANON) {
            Ok(())
        } else {
            p.no_viable_alternative(&[BLANK_NODE_LABEL, ANON])
        }
    })
}

pub fn starts_blank_node(p: &mut Parser<'_>) -> bool {
    p.check_any(&[BLANK_NODE_LABEL, ANON])
}

pub fn starts_literal(p: &mut Parser<'_>) -> bool {
    let string = p.check_any(&STRINGS);
    let number = p.check_any(&NUMBERS);
    let boolean = p.check_any(&[TRUE, FALSE]);
    string || number || boolean
}

/// `RDFLiteral | NumericLiteral | BooleanLiteral`
pub fn literal(p: &mut Parser<'_>) -> Step {
    if p.check_any(&STRINGS) {
        rdf_literal(p)
    } else if p.check_any(&NUMBERS) {
        p.rule("NumericLiteral", |p| {
            p.bump();
            Ok(())
        })
    } else if p.check_any(&[TRUE, FALSE]) {
        p.rule("BooleanLiteral", |p| {
            p.bump();
            Ok(())
        })
    } else {
        let mut expected = STRINGS.to_vec();
        expected.extend(NUMBERS);
        expected.extend([TRUE, FALSE]);
        p.no_viable_alternative(&expected)
    }
}

pub fn rdf_literal(p: &mut Parser<'_>) -> Step {
    p.rule("RDFLiteral", |p| {
        p.rule("String", |p| {
            if p.check_any(&STRINGS) {
                p.bump();
                Ok(())
            } else {
                p.no_viable_alternative(&STRINGS)
            }
        })?;
        if p.eat(LANGTAG) {
            return Ok(());
        }
        if p.eat(DOUBLE_CARET) {
            return iri(p);
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{Lexer, Vocabulary};
    use stardog_analysis::token::Token;

    fn lex(text: &str, signed: bool) -> Vec<Token> {
        let mut types = punctuation();
        types.extend(terms(signed));
        let vocabulary = Vocabulary::new(types);
        Lexer::new(&vocabulary, vec![pattern(r"^\s+")]).tokenize(text)
    }

    fn names(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::name).collect()
    }

    #[test]
    fn prefixed_names_do_not_swallow_a_trailing_period() {
        let tokens = lex("foaf:name. foaf: :x _:b1.", false);
        assert_eq!(
            names(&tokens),
            [PNAME_LN, PERIOD, PNAME_NS, PNAME_LN, BLANK_NODE_LABEL, PERIOD]
        );
        assert_eq!(tokens[0].image, "foaf:name");
    }

    #[test]
    fn literals() {
        let tokens = lex(r#""a\"b"@en 'x'^^<http://t> """long "quoted" text""" 1.5e3 .5"#, false);
        assert_eq!(
            names(&tokens),
            [
                STRING_LITERAL2,
                LANGTAG,
                STRING_LITERAL1,
                DOUBLE_CARET,
                IRIREF,
                STRING_LITERAL_LONG2,
                DOUBLE,
                DECIMAL
            ]
        );
    }

    #[test]
    fn signs_attach_to_numbers_only_when_asked() {
        assert_eq!(names(&lex("-12", true)), [INTEGER]);
        assert_eq!(names(&lex("-12", false))[1], INTEGER);
    }

    #[test]
    fn anonymous_blank_node_spans_inner_whitespace() {
        let tokens = lex("[ ] [", false);
        assert_eq!(names(&tokens), [ANON, LBRACKET]);
    }
}
