//! Recursive-descent parsing toolkit shared by the front-ends.
//!
//! Grammar rules are plain functions over a [`Parser`]. They test the next
//! token with [`Parser::check`] and friends, consume it with
//! [`Parser::eat`]/[`Parser::expect`], and open CST nodes with
//! [`Parser::rule`]. Parsing halts at the first syntax error; the partial
//! tree built so far is kept.
//!
//! The same rule functions power content assist. In assist mode the parser
//! runs over a token prefix, and every token test made once the prefix is
//! exhausted records the tested type as a candidate instead of matching.
//! Because rules test alternatives one after another, this collects every
//! token type that could come next.

use stardog_analysis::cst::{CstNode, RuleNode};
use stardog_analysis::grammar::{CompletionCandidate, SyntaxError, SyntaxErrorKind};
use stardog_analysis::token::{Category, Token};

use crate::lexer::Vocabulary;
use crate::messages;

/// Deepest rule nesting before parsing gives up.
pub const MAX_DEPTH: usize = 256;

/// Parsing stopped; the reason is recorded on the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Halt;

pub type Step = Result<(), Halt>;

pub struct Parser<'a> {
    vocabulary: &'a Vocabulary,
    tokens: &'a [Token],
    pos: usize,
    eof: Token,
    open: Vec<RuleNode>,
    root: Option<RuleNode>,
    error: Option<SyntaxError>,
    candidates: Option<Vec<CompletionCandidate>>,
}

impl<'a> Parser<'a> {
    pub fn new(vocabulary: &'a Vocabulary, tokens: &'a [Token], text_len: usize) -> Self {
        Self {
            vocabulary,
            tokens,
            pos: 0,
            eof: Token::end_of_input(text_len),
            open: Vec::new(),
            root: None,
            error: None,
            candidates: None,
        }
    }

    /// A parser that collects candidates for the token after `prefix`.
    pub fn for_content_assist(vocabulary: &'a Vocabulary, prefix: &'a [Token]) -> Self {
        let end = prefix.last().map_or(0, Token::end);
        let mut parser = Self::new(vocabulary, prefix, end);
        parser.candidates = Some(Vec::new());
        parser
    }

    pub fn vocabulary(&self) -> &'a Vocabulary {
        self.vocabulary
    }

    /// The next token, or the end-of-input sentinel.
    pub fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    pub fn peek_nth(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).unwrap_or(&self.eof)
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn assisting_at_end(&self) -> bool {
        self.candidates.is_some() && self.at_end()
    }

    fn record(&mut self, name: &str) {
        let Some(token_type) = self.vocabulary.get(name).cloned() else {
            return;
        };
        let rule_stack = self.rule_stack();
        if let Some(candidates) = self.candidates.as_mut() {
            candidates.push(CompletionCandidate::new(token_type, rule_stack));
        }
    }

    /// Is the next token of type `name`? Types missing from the vocabulary
    /// never match, which is how dialects switch productions off.
    pub fn check(&mut self, name: &str) -> bool {
        if !self.vocabulary.contains(name) {
            return false;
        }
        if self.assisting_at_end() {
            self.record(name);
            return false;
        }
        self.peek().name() == name
    }

    pub fn check_any(&mut self, names: &[&str]) -> bool {
        let mut found = false;
        for name in names {
            // keep testing after a hit so assist mode records every name
            found |= self.check(name);
        }
        found
    }

    /// Is the next token tagged with `category`? `representative` is the
    /// type offered during content assist.
    pub fn check_category(&mut self, category: Category, representative: &str) -> bool {
        if self.assisting_at_end() {
            self.record(representative);
            return false;
        }
        self.peek().is(category)
    }

    /// Consume the next token into the open rule.
    pub fn bump(&mut self) {
        let Some(token) = self.tokens.get(self.pos) else {
            return;
        };
        self.pos += 1;
        if let Some(node) = self.open.last_mut() {
            node.children.push(CstNode::Token(token.clone()));
        }
    }

    pub fn eat(&mut self, name: &str) -> bool {
        let matched = self.check(name);
        if matched {
            self.bump();
        }
        matched
    }

    pub fn eat_category(&mut self, category: Category, representative: &str) -> bool {
        let matched = self.check_category(category, representative);
        if matched {
            self.bump();
        }
        matched
    }

    pub fn expect(&mut self, name: &str) -> Step {
        if self.eat(name) {
            return Ok(());
        }
        let message = messages::mismatched_token(self.vocabulary, name);
        self.fail(SyntaxErrorKind::MismatchedToken, message, None)
    }

    pub fn expect_category(&mut self, category: Category, representative: &str) -> Step {
        if self.eat_category(category, representative) {
            return Ok(());
        }
        let message = messages::mismatched_token(self.vocabulary, representative);
        self.fail(SyntaxErrorKind::MismatchedToken, message, None)
    }

    /// None of a rule's alternatives start with the next token.
    pub fn no_viable_alternative(&mut self, expected: &[&str]) -> Step {
        let message = messages::expected_one_of(self.vocabulary, expected);
        self.fail(SyntaxErrorKind::NoViableAlternative, message, None)
    }

    /// A one-or-more repetition did not match even once.
    pub fn early_exit(&mut self, expected: &[&str]) -> Step {
        let message = messages::expected_one_of(self.vocabulary, expected);
        let previous = self.pos.checked_sub(1).and_then(|idx| self.tokens.get(idx)).cloned();
        self.fail(SyntaxErrorKind::EarlyExit, message, previous)
    }

    /// Run `item` while `starts` holds, requiring at least one iteration.
    pub fn one_or_more(
        &mut self,
        mut starts: impl FnMut(&mut Self) -> bool,
        mut item: impl FnMut(&mut Self) -> Step,
        expected: &[&str],
    ) -> Step {
        if !starts(self) {
            return self.early_exit(expected);
        }
        while starts(self) {
            item(self)?;
        }
        Ok(())
    }

    /// Everything must have been consumed.
    pub fn expect_end(&mut self) -> Step {
        if self.at_end() {
            return Ok(());
        }
        self.fail(
            SyntaxErrorKind::NotAllInputParsed,
            messages::NOT_ALL_INPUT_PARSED.to_string(),
            None,
        )
    }

    fn fail(&mut self, kind: SyntaxErrorKind, message: String, previous: Option<Token>) -> Step {
        if self.error.is_none() && self.candidates.is_none() {
            self.error = Some(SyntaxError {
                kind,
                message,
                token: self.peek().clone(),
                rule_stack: self.rule_stack(),
                previous_token: previous,
            });
        }
        Err(Halt)
    }

    pub fn rule_stack(&self) -> Vec<String> {
        self.open.iter().map(|node| node.name.clone()).collect()
    }

    /// Run `body` inside a new CST node named `name`. The node is attached
    /// to its parent even when `body` halts.
    pub fn rule(&mut self, name: &str, body: impl FnOnce(&mut Self) -> Step) -> Step {
        if self.open.len() >= MAX_DEPTH {
            return self.fail(
                SyntaxErrorKind::NoViableAlternative,
                messages::TOO_DEEP.to_string(),
                None,
            );
        }
        self.open.push(RuleNode::new(name));
        let result = body(self);
        if let Some(node) = self.open.pop() {
            match self.open.last_mut() {
                Some(parent) => parent.children.push(CstNode::Rule(node)),
                None => self.root = Some(node),
            }
        }
        result
    }

    /// The tree and first error of a full parse.
    pub fn finish(self) -> (CstNode, Option<SyntaxError>) {
        let root = self.root.unwrap_or_else(|| RuleNode::new("Document"));
        (CstNode::Rule(root), self.error)
    }

    /// Candidates recorded in assist mode, in encounter order.
    pub fn into_candidates(self) -> Vec<CompletionCandidate> {
        self.candidates.unwrap_or_default()
    }
}

/// Run `entry` over a whole token list.
pub fn parse_tokens(
    vocabulary: &Vocabulary,
    tokens: &[Token],
    text_len: usize,
    root: &str,
    entry: impl FnOnce(&mut Parser<'_>) -> Step,
) -> (CstNode, Vec<SyntaxError>) {
    let mut parser = Parser::new(vocabulary, tokens, text_len);
    let _ = parser.rule(root, |p| {
        entry(p)?;
        p.expect_end()
    });
    let (cst, error) = parser.finish();
    (cst, error.into_iter().collect())
}

/// Run `entry` in assist mode over `prefix`.
pub fn assist_tokens(
    vocabulary: &Vocabulary,
    prefix: &[Token],
    root: &str,
    entry: impl FnOnce(&mut Parser<'_>) -> Step,
) -> Vec<CompletionCandidate> {
    let mut parser = Parser::for_content_assist(vocabulary, prefix);
    let _ = parser.rule(root, entry);
    parser.into_candidates()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{pattern, Lexer};
    use stardog_analysis::token::TokenType;

    // List := '(' Item+ ')' ; Item := 'x' | 'y'
    fn vocabulary() -> Vocabulary {
        Vocabulary::new(vec![
            TokenType::literal("LParen", "("),
            TokenType::literal("RParen", ")"),
            TokenType::literal("X", "x"),
            TokenType::literal("Y", "y"),
        ])
    }

    fn list(p: &mut Parser<'_>) -> Step {
        p.rule("List", |p| {
            p.expect("LParen")?;
            if !p.check_any(&["X", "Y"]) {
                return p.early_exit(&["X", "Y"]);
            }
            while p.check_any(&["X", "Y"]) {
                p.rule("Item", |p| {
                    p.bump();
                    Ok(())
                })?;
            }
            p.expect("RParen")
        })
    }

    fn lex(vocabulary: &Vocabulary, text: &str) -> Vec<Token> {
        Lexer::new(vocabulary, vec![pattern(r"^\s+")]).tokenize(text)
    }

    #[test]
    fn builds_a_tree_for_valid_input() {
        let vocabulary = vocabulary();
        let tokens = lex(&vocabulary, "( x y )");
        let (cst, errors) = parse_tokens(&vocabulary, &tokens, 7, "Doc", list);
        assert!(errors.is_empty());
        assert_eq!(cst.tokens().len(), 4);
        assert_eq!(cst.name(), "Doc");
    }

    #[test]
    fn mismatch_at_end_of_input() {
        let vocabulary = vocabulary();
        let tokens = lex(&vocabulary, "( x ");
        let (cst, errors) = parse_tokens(&vocabulary, &tokens, 4, "Doc", list);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "')' expected.");
        assert!(errors[0].token.is_end_of_input());
        assert_eq!(errors[0].rule_stack, ["Doc", "List"]);
        // partial tree survives
        assert_eq!(cst.tokens().len(), 2);
    }

    #[test]
    fn early_exit_remembers_the_previous_token() {
        let vocabulary = vocabulary();
        let tokens = lex(&vocabulary, "( )");
        let (_, errors) = parse_tokens(&vocabulary, &tokens, 3, "Doc", list);
        assert_eq!(errors[0].kind, SyntaxErrorKind::EarlyExit);
        assert_eq!(errors[0].message, "\tExpected one of the following:\n 'x'\n 'y'");
        assert_eq!(errors[0].previous_token.as_ref().map(|t| t.image.as_str()), Some("("));
    }

    #[test]
    fn trailing_input_is_an_error() {
        let vocabulary = vocabulary();
        let tokens = lex(&vocabulary, "(x) y");
        let (_, errors) = parse_tokens(&vocabulary, &tokens, 5, "Doc", list);
        assert_eq!(errors[0].message, "Expected EOF.");
        assert_eq!(errors[0].token.image, "y");
    }

    #[test]
    fn assist_records_alternatives_after_the_prefix() {
        let vocabulary = vocabulary();
        let tokens = lex(&vocabulary, "( x");
        let candidates = assist_tokens(&vocabulary, &tokens, "Doc", list);
        let names: Vec<_> = candidates
            .iter()
            .map(|c| c.next_token_type.name.as_str())
            .collect();
        assert_eq!(names, ["X", "Y", "RParen"]);
        assert_eq!(candidates[2].rule_stack, ["Doc", "List"]);
    }

    #[test]
    fn assist_over_an_invalid_prefix_yields_nothing() {
        let vocabulary = vocabulary();
        let tokens = lex(&vocabulary, ") x");
        assert!(assist_tokens(&vocabulary, &tokens, "Doc", list).is_empty());
    }

    #[test]
    fn deep_nesting_halts_instead_of_overflowing() {
        fn nested(p: &mut Parser<'_>) -> Step {
            p.rule("Nested", |p| {
                if p.eat("LParen") {
                    nested(p)?;
                    p.expect("RParen")
                } else {
                    p.expect("X")
                }
            })
        }
        let vocabulary = vocabulary();
        let text = "(".repeat(MAX_DEPTH * 2);
        let tokens = lex(&vocabulary, &text);
        let (_, errors) = parse_tokens(&vocabulary, &tokens, text.len(), "Doc", nested);
        assert_eq!(errors[0].message, messages::TOO_DEEP);
    }
}
