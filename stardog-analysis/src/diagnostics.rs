//! Lexical and syntactic diagnostics.

use lsp_types::{Diagnostic, DiagnosticSeverity};

use crate::grammar::{ParseOutput, SyntaxError};
use crate::position::LineIndex;
use crate::profile::DiagnosticSettings;
use crate::token::Category;

pub const UNKNOWN_TOKEN_MESSAGE: &str = "Unknown token";

/// Diagnostics for one parse of `text`. The parse output must already be in
/// raw-text coordinates (see [`crate::grammar::parse_document`]).
pub fn collect_diagnostics(
    text: &str,
    output: &ParseOutput,
    settings: &DiagnosticSettings,
) -> Vec<Diagnostic> {
    if text.is_empty() {
        return Vec::new();
    }
    let index = LineIndex::new(text);
    let mut diagnostics = Vec::new();

    if settings.report_lexical_errors {
        diagnostics.extend(
            output
                .tokens
                .iter()
                .filter(|token| token.is(Category::Unknown))
                .map(|token| Diagnostic {
                    range: index.range(token.start_offset, token.end()),
                    severity: Some(DiagnosticSeverity::ERROR),
                    message: UNKNOWN_TOKEN_MESSAGE.to_string(),
                    ..Diagnostic::default()
                }),
        );
    }

    for error in output.errors.iter().chain(&output.semantic_errors) {
        let (start, end) = error_span(error, text.len());
        let source = match &settings.source_hook {
            Some(hook) => hook(error),
            None => error.innermost_rule().map(str::to_string),
        };
        diagnostics.push(Diagnostic {
            range: index.range(start, end),
            severity: Some(DiagnosticSeverity::ERROR),
            source,
            message: error.message.clone(),
            ..Diagnostic::default()
        });
    }

    diagnostics
}

/// Byte span a syntax error is reported at. End-of-input errors collapse to a
/// single position: just past the last consumed token when the parser knows
/// it, otherwise the end of the document.
pub fn error_span(error: &SyntaxError, len: usize) -> (usize, usize) {
    let token = &error.token;
    if token.is_end_of_input() {
        let at = error
            .previous_token
            .as_ref()
            .map_or(len, |previous| previous.end().min(len));
        return (at, at);
    }
    let start = token.start_offset.min(len);
    (start, token.end().min(len).max(start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::CstNode;
    use crate::grammar::SyntaxErrorKind;
    use crate::token::{Token, TokenType};
    use lsp_types::{Position, Range};
    use std::sync::Arc;

    fn token(name: &str, image: &str, start: usize) -> Token {
        Token::new(Arc::new(TokenType::literal(name, image)), image, start)
    }

    fn error(token: Token, stack: &[&str], previous: Option<Token>) -> SyntaxError {
        SyntaxError {
            kind: SyntaxErrorKind::MismatchedToken,
            message: "'}' expected.".into(),
            token,
            rule_stack: stack.iter().map(|s| s.to_string()).collect(),
            previous_token: previous,
        }
    }

    fn output(tokens: Vec<Token>, errors: Vec<SyntaxError>) -> ParseOutput {
        ParseOutput {
            cst: CstNode::rule("Doc", vec![]),
            tokens,
            errors,
            semantic_errors: vec![],
            escapes: None,
        }
    }

    fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
        Range::new(Position::new(sl, sc), Position::new(el, ec))
    }

    #[test]
    fn empty_document_has_no_diagnostics() {
        let out = output(vec![], vec![error(Token::end_of_input(0), &["Doc"], None)]);
        assert!(collect_diagnostics("", &out, &DiagnosticSettings::default()).is_empty());
    }

    #[test]
    fn end_of_input_without_previous_token_sits_at_document_end() {
        let text = "select * { ?a ?b ?c ";
        let out = output(
            vec![],
            vec![error(
                Token::end_of_input(text.len()),
                &["SparqlDoc", "GroupGraphPattern"],
                None,
            )],
        );
        let diagnostics = collect_diagnostics(text, &out, &DiagnosticSettings::default());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].range, range(0, 20, 0, 20));
        assert_eq!(diagnostics[0].source.as_deref(), Some("GroupGraphPattern"));
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
    }

    #[test]
    fn end_of_input_with_previous_token_sits_after_it() {
        let text = "a b   ";
        let out = output(
            vec![],
            vec![error(Token::end_of_input(6), &[], Some(token("B", "b", 2)))],
        );
        let diagnostics = collect_diagnostics(text, &out, &DiagnosticSettings::default());
        assert_eq!(diagnostics[0].range, range(0, 3, 0, 3));
        assert_eq!(diagnostics[0].source, None);
    }

    #[test]
    fn offending_token_span_is_reported() {
        let text = "{\n  ]";
        let out = output(vec![], vec![error(token("RBracket", "]", 4), &["Doc", "Block"], None)]);
        let diagnostics = collect_diagnostics(text, &out, &DiagnosticSettings::default());
        assert_eq!(diagnostics[0].range, range(1, 2, 1, 3));
    }

    #[test]
    fn unknown_tokens_are_reported_when_enabled() {
        let unknown = Arc::new(
            TokenType::literal("Unknown", "").with_categories(&[Category::Unknown]),
        );
        let text = "ok %%";
        let out = output(vec![token("Word", "ok", 0), Token::new(unknown, "%%", 3)], vec![]);

        assert!(collect_diagnostics(text, &out, &DiagnosticSettings::default()).is_empty());

        let settings = DiagnosticSettings {
            report_lexical_errors: true,
            source_hook: None,
        };
        let diagnostics = collect_diagnostics(text, &out, &settings);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, UNKNOWN_TOKEN_MESSAGE);
        assert_eq!(diagnostics[0].range, range(0, 3, 0, 5));
    }

    #[test]
    fn source_hook_overrides_rule_attribution() {
        let text = "x";
        let out = output(vec![], vec![error(token("X", "x", 0), &["Doc", "Inner"], None)]);
        let settings = DiagnosticSettings {
            report_lexical_errors: false,
            source_hook: Some(Arc::new(|error: &SyntaxError| {
                error.rule_stack.first().map(|rule| format!("{rule}!"))
            })),
        };
        let diagnostics = collect_diagnostics(text, &out, &settings);
        assert_eq!(diagnostics[0].source.as_deref(), Some("Doc!"));
    }
}
