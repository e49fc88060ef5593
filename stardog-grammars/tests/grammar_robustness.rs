use proptest::prelude::*;
use stardog_analysis::grammar::{parse_document, Grammar};
use stardog_analysis::token::Token;
use stardog_grammars::{GraphQlGrammar, SparqlDialect, SparqlGrammar, TurtleGrammar};

fn grammars() -> Vec<(Box<dyn Grammar>, &'static str)> {
    vec![
        (
            Box::new(SparqlGrammar::new(SparqlDialect::Stardog)),
            stardog_grammars::sparql::ENTRY_RULE,
        ),
        (
            Box::new(GraphQlGrammar::new(Default::default())),
            stardog_grammars::graphql::ENTRY_RULE,
        ),
        (
            Box::new(TurtleGrammar::turtle()),
            stardog_grammars::turtle::TURTLE_ENTRY_RULE,
        ),
        (
            Box::new(TurtleGrammar::trig()),
            stardog_grammars::turtle::TRIG_ENTRY_RULE,
        ),
    ]
}

fn assert_tokens_cover_source(text: &str, tokens: &[Token]) {
    let mut last_end = 0;
    for token in tokens {
        assert!(token.start_offset >= last_end, "tokens overlap in {text:?}");
        assert!(token.end() <= text.len());
        assert!(text.is_char_boundary(token.start_offset));
        assert!(text.is_char_boundary(token.end()), "{token:?} splits a character");
        last_end = token.end();
    }
}

proptest! {
    #[test]
    fn parsing_never_panics(text in "\\PC*") {
        for (grammar, _) in grammars() {
            let output = parse_document(grammar.as_ref(), &text);
            prop_assert!(output.errors.len() <= 1);
            assert_tokens_cover_source(&text, &output.tokens);
        }
    }

    #[test]
    fn query_shaped_input_never_panics(
        text in "(select|SELECT|where|\\{|\\}|\\(|\\)|\\?x|<urn:a>|ex:b|\"s\"|[0-9]+|\\.|;|,| |\n|query|fragment|@prefix|graph|paths|\\\\u0041)*"
    ) {
        for (grammar, entry) in grammars() {
            let output = parse_document(grammar.as_ref(), &text);
            assert_tokens_cover_source(&text, &output.tokens);
            // every prefix of the token list must be assistable
            for len in 0..=output.tokens.len().min(16) {
                let _ = grammar.content_assist(entry, &output.tokens[..len]);
            }
        }
    }
}

#[test]
fn unbalanced_nesting_reports_one_error() {
    let text = "(".repeat(4_000);
    for (grammar, _) in grammars() {
        let output = parse_document(grammar.as_ref(), &text);
        assert!(output.errors.len() <= 1);
    }
}

#[test]
fn every_grammar_accepts_its_empty_document_or_reports_it() {
    for (grammar, _) in grammars() {
        let output = grammar.parse("");
        assert!(output.tokens.is_empty());
        assert!(output.errors.len() <= 1);
    }
}

#[test]
fn multibyte_tokens_end_on_char_boundaries() {
    let text = "@prefix é: <urn:é> .\né:ü é:日本 \"日本語\" .\nselect ?ü { ?ü é:a \"é\" }";
    for (grammar, _) in grammars() {
        let output = parse_document(grammar.as_ref(), text);
        assert_tokens_cover_source(text, &output.tokens);
    }
}
