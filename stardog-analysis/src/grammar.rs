//! The contract every grammar front-end implements.
//!
//! The engine never looks inside a grammar. It asks for a full parse of the
//! document and, during completion, for the token types that could follow a
//! given token prefix.

use std::ops::Range;
use std::sync::Arc;

use crate::cst::CstNode;
use crate::escapes::EscapeMap;
use crate::token::{Token, TokenType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    MismatchedToken,
    NoViableAlternative,
    EarlyExit,
    NotAllInputParsed,
    /// Reported by a front-end's own checks after a successful parse.
    Semantic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    /// Offending token, possibly the end-of-input sentinel.
    pub token: Token,
    /// Enclosing rules, outermost first.
    pub rule_stack: Vec<String>,
    /// Last token consumed before an early exit, when known.
    pub previous_token: Option<Token>,
}

impl SyntaxError {
    pub fn innermost_rule(&self) -> Option<&str> {
        self.rule_stack.last().map(String::as_str)
    }
}

/// A token type that would be valid at the completion point.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionCandidate {
    pub next_token_type: Arc<TokenType>,
    pub rule_stack: Vec<String>,
    /// Explicit byte range to replace instead of the token at the cursor.
    pub replacement_range: Option<Range<usize>>,
}

impl CompletionCandidate {
    pub fn new(next_token_type: Arc<TokenType>, rule_stack: Vec<String>) -> Self {
        Self {
            next_token_type,
            rule_stack,
            replacement_range: None,
        }
    }

    pub fn in_rule(&self, rule: &str) -> bool {
        self.rule_stack.iter().any(|name| name == rule)
    }
}

#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub cst: CstNode,
    /// Tokens of the parse, without the end-of-input sentinel.
    pub tokens: Vec<Token>,
    pub errors: Vec<SyntaxError>,
    pub semantic_errors: Vec<SyntaxError>,
    /// Present when the grammar lexed an unescaped copy of the text.
    pub escapes: Option<EscapeMap>,
}

impl ParseOutput {
    /// Move every offset into raw-text coordinates and drop the escape map.
    pub fn into_raw_coordinates(mut self, raw: &str) -> Self {
        let Some(escapes) = self.escapes.take() else {
            return self;
        };
        for token in &mut self.tokens {
            escapes.remap_token(token, raw);
        }
        escapes.remap_cst(&mut self.cst, raw);
        for error in self.errors.iter_mut().chain(self.semantic_errors.iter_mut()) {
            if error.token.is_end_of_input() {
                error.token.start_offset = raw.len();
                error.token.end_offset = raw.len();
            } else {
                escapes.remap_token(&mut error.token, raw);
            }
            if let Some(previous) = error.previous_token.as_mut() {
                escapes.remap_token(previous, raw);
            }
        }
        self
    }
}

pub trait Grammar: Send + Sync {
    /// Parse the whole document. Offsets may refer to an unescaped copy of
    /// `text`, in which case `escapes` must be set.
    fn parse(&self, text: &str) -> ParseOutput;

    /// Token types that could follow `tokens` when parsing from `start_rule`.
    fn content_assist(&self, start_rule: &str, tokens: &[Token]) -> Vec<CompletionCandidate>;

    /// Every token type the grammar knows about.
    fn vocabulary(&self) -> &[Arc<TokenType>];
}

/// Parse `text` and normalize the result to raw-text offsets.
pub fn parse_document(grammar: &dyn Grammar, text: &str) -> ParseOutput {
    grammar.parse(text).into_raw_coordinates(text)
}
