//! Token vocabulary shared by every grammar front-end.
//!
//! A [`TokenType`] names one kind of lexeme together with the closed set of
//! [`Category`] tags it belongs to and the pattern that recognizes it. Lexers
//! produce [`Token`]s that point back at their type through an `Arc`, so a
//! token list can be cached and cloned without copying the vocabulary.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

/// Closed set of category tags a token type may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Text the lexer could not match. Reported as a lexical diagnostic.
    Unknown,
    /// End-of-input sentinel.
    EndOfInput,
    Keyword,
    Punctuator,
    /// Identifier-like text, used for "word" detection during completion.
    Name,
    Variable,
    Iri,
    PrefixedName,
    Literal,
    BuiltInCall,
    Directive,
}

/// How a token type is recognized, and how it renders as completion text.
#[derive(Debug, Clone)]
pub enum TokenPattern {
    /// Exact text, matched case-sensitively.
    Literal(String),
    /// Fixed keyword, matched case-insensitively. Words are separated by
    /// arbitrary whitespace in the source but rendered with single spaces.
    Keyword(String),
    /// General regular expression. Not textually completable.
    Regex(Regex),
    /// Matched by hand-written lexer code. Not textually completable.
    Custom,
    /// Never lexed; stands for every type tagged with the category.
    NotApplicable(Category),
}

#[derive(Debug, Clone)]
pub struct TokenType {
    pub name: String,
    pub categories: Vec<Category>,
    pub pattern: TokenPattern,
    /// Example shown in error messages, e.g. `PNAME_NS e.g. foaf:`.
    pub label: Option<String>,
}

impl TokenType {
    pub fn new(name: impl Into<String>, pattern: TokenPattern) -> Self {
        Self {
            name: name.into(),
            categories: Vec::new(),
            pattern,
            label: None,
        }
    }

    pub fn literal(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, TokenPattern::Literal(text.into()))
    }

    pub fn keyword(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, TokenPattern::Keyword(text.into())).with_categories(&[Category::Keyword])
    }

    pub fn regex(name: impl Into<String>, regex: Regex) -> Self {
        Self::new(name, TokenPattern::Regex(regex))
    }

    pub fn category(name: impl Into<String>, category: Category) -> Self {
        Self::new(name, TokenPattern::NotApplicable(category))
    }

    pub fn with_categories(mut self, categories: &[Category]) -> Self {
        for category in categories {
            if !self.categories.contains(category) {
                self.categories.push(*category);
            }
        }
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    /// Text a completion for this type would insert, if it has one.
    pub fn completion_text(&self) -> Option<String> {
        match &self.pattern {
            TokenPattern::Literal(text) => Some(text.clone()),
            TokenPattern::Keyword(text) => Some(normalize_keyword(text)),
            TokenPattern::Regex(_) | TokenPattern::Custom | TokenPattern::NotApplicable(_) => None,
        }
    }

    /// Name used in syntax error messages.
    pub fn display_name(&self) -> String {
        if let Some(label) = &self.label {
            return format!("{} e.g. {}", self.name, label);
        }
        match &self.pattern {
            TokenPattern::Literal(text) => format!("'{text}'"),
            TokenPattern::Keyword(text) => format!("'{}'", normalize_keyword(text)),
            _ => self.name.clone(),
        }
    }
}

impl PartialEq for TokenType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TokenType {}

/// Collapse runs of whitespace inside a multi-word keyword.
pub fn normalize_keyword(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One lexeme. `end_offset` is inclusive; offsets are byte offsets.
#[derive(Clone, PartialEq)]
pub struct Token {
    pub token_type: Arc<TokenType>,
    pub image: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Token {
    pub fn new(token_type: Arc<TokenType>, image: impl Into<String>, start_offset: usize) -> Self {
        let image = image.into();
        let end_offset = (start_offset + image.len()).saturating_sub(1).max(start_offset);
        Self {
            token_type,
            image,
            start_offset,
            end_offset,
        }
    }

    /// The end-of-input sentinel sitting at `len`.
    pub fn end_of_input(len: usize) -> Self {
        Self {
            token_type: Arc::new(
                TokenType::new("EOF", TokenPattern::Custom)
                    .with_categories(&[Category::EndOfInput]),
            ),
            image: String::new(),
            start_offset: len,
            end_offset: len,
        }
    }

    pub fn name(&self) -> &str {
        &self.token_type.name
    }

    pub fn is(&self, category: Category) -> bool {
        self.token_type.is(category)
    }

    pub fn is_end_of_input(&self) -> bool {
        self.is(Category::EndOfInput)
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        if self.image.is_empty() {
            self.start_offset
        } else {
            self.end_offset + 1
        }
    }

    /// True when `next` starts right where this token ends.
    pub fn abuts(&self, next: &Token) -> bool {
        !self.image.is_empty() && self.end_offset + 1 == next.start_offset
    }

    /// True for identifier-like tokens a user may still be typing.
    pub fn is_word_like(&self) -> bool {
        !self.image.is_empty()
            && self
                .image
                .chars()
                .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-')
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({:?} @ {}..={})",
            self.token_type.name, self.image, self.start_offset, self.end_offset
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyword(text: &str) -> Arc<TokenType> {
        Arc::new(TokenType::keyword(text.to_uppercase(), text))
    }

    #[test]
    fn end_offset_is_inclusive() {
        let token = Token::new(keyword("select"), "select", 0);
        assert_eq!(token.end_offset, 5);
        assert_eq!(token.end(), 6);
    }

    #[test]
    fn abutting_tokens_have_no_gap() {
        let first = Token::new(keyword("str"), "str", 0);
        let second = Token::new(Arc::new(TokenType::literal("S", "s")), "s", 3);
        let spaced = Token::new(Arc::new(TokenType::literal("S", "s")), "s", 4);
        assert!(first.abuts(&second));
        assert!(!first.abuts(&spaced));
    }

    #[test]
    fn display_names_follow_label_then_pattern() {
        let labelled = TokenType::regex("PNAME_NS", Regex::new("x").unwrap()).with_label("foaf:");
        assert_eq!(labelled.display_name(), "PNAME_NS e.g. foaf:");
        assert_eq!(TokenType::literal("RCurly", "}").display_name(), "'}'");
        assert_eq!(
            TokenType::keyword("PATHS_SHORTEST", "paths  shortest").display_name(),
            "'paths shortest'"
        );
        assert_eq!(
            TokenType::regex("VAR1", Regex::new("x").unwrap()).display_name(),
            "VAR1"
        );
    }

    #[test]
    fn category_only_types_have_no_completion_text() {
        let ty = TokenType::category("BuiltInCall", Category::BuiltInCall);
        assert_eq!(ty.completion_text(), None);
        assert_eq!(
            TokenType::keyword("DELETE_WHERE", "delete where").completion_text(),
            Some("delete where".to_string())
        );
    }
}
