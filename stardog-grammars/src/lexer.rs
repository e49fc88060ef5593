//! Longest-match lexer driven by a token vocabulary.
//!
//! At each position the lexer first drops skipped text (whitespace,
//! comments), then tries every token type and keeps the longest match. Ties
//! go to the type listed first, so vocabularies list keywords before the
//! general identifier patterns they overlap with. Text nothing matches
//! becomes an `Unknown` token covering a word, or a single character.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use stardog_analysis::token::{Category, Token, TokenPattern, TokenType};

pub const UNKNOWN: &str = "Unknown";

/// The token types of one grammar, addressable by name.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    types: Vec<Arc<TokenType>>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn new(types: Vec<TokenType>) -> Self {
        let mut all: Vec<Arc<TokenType>> = types.into_iter().map(Arc::new).collect();
        if !all.iter().any(|ty| ty.name == UNKNOWN) {
            all.push(Arc::new(
                TokenType::new(UNKNOWN, TokenPattern::Custom).with_categories(&[Category::Unknown]),
            ));
        }
        let index = all
            .iter()
            .enumerate()
            .map(|(idx, ty)| (ty.name.clone(), idx))
            .collect();
        Self { types: all, index }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TokenType>> {
        self.index.get(name).map(|idx| &self.types[*idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn types(&self) -> &[Arc<TokenType>] {
        &self.types
    }

    pub fn display_name(&self, name: &str) -> String {
        self.get(name)
            .map_or_else(|| name.to_string(), |ty| ty.display_name())
    }
}

enum Matcher {
    Literal(String),
    Keyword(Vec<String>),
    Regex(Regex),
}

impl Matcher {
    fn match_len(&self, rest: &str) -> Option<usize> {
        match self {
            Matcher::Literal(text) => rest.starts_with(text.as_str()).then_some(text.len()),
            Matcher::Keyword(words) => keyword_len(rest, words),
            Matcher::Regex(regex) => regex
                .find(rest)
                .filter(|found| found.start() == 0)
                .map(|found| found.end()),
        }
    }
}

/// Case-insensitive match of `words` separated by at least one whitespace.
fn keyword_len(rest: &str, words: &[String]) -> Option<usize> {
    let mut len = 0;
    for (idx, word) in words.iter().enumerate() {
        if idx > 0 {
            let tail = &rest[len..];
            let gap = tail.len() - tail.trim_start().len();
            if gap == 0 {
                return None;
            }
            len += gap;
        }
        let candidate = rest.get(len..len + word.len())?;
        if !candidate.eq_ignore_ascii_case(word) {
            return None;
        }
        len += word.len();
    }
    Some(len)
}

struct LexRule {
    token_type: Arc<TokenType>,
    matcher: Matcher,
}

pub struct Lexer {
    rules: Vec<LexRule>,
    skip: Vec<Regex>,
    unknown: Arc<TokenType>,
}

impl Lexer {
    /// `skip` patterns must be anchored with `^`, as must regex token types.
    pub fn new(vocabulary: &Vocabulary, skip: Vec<Regex>) -> Self {
        let rules = vocabulary
            .types()
            .iter()
            .filter_map(|ty| {
                let matcher = match &ty.pattern {
                    TokenPattern::Literal(text) => Matcher::Literal(text.clone()),
                    TokenPattern::Keyword(text) => {
                        Matcher::Keyword(text.split_whitespace().map(str::to_string).collect())
                    }
                    TokenPattern::Regex(regex) => Matcher::Regex(regex.clone()),
                    TokenPattern::Custom | TokenPattern::NotApplicable(_) => return None,
                };
                Some(LexRule {
                    token_type: Arc::clone(ty),
                    matcher,
                })
            })
            .collect();
        let unknown = vocabulary
            .get(UNKNOWN)
            .cloned()
            .unwrap_or_else(|| Arc::new(TokenType::new(UNKNOWN, TokenPattern::Custom)));
        Self {
            rules,
            skip,
            unknown,
        }
    }

    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < text.len() {
            let rest = &text[pos..];

            let skipped = self
                .skip
                .iter()
                .filter_map(|regex| regex.find(rest))
                .filter(|found| found.start() == 0)
                .map(|found| found.end())
                .max()
                .unwrap_or(0);
            if skipped > 0 {
                pos += skipped;
                continue;
            }

            let mut best: Option<(usize, &Arc<TokenType>)> = None;
            for rule in &self.rules {
                if let Some(len) = rule.matcher.match_len(rest) {
                    if len > 0 && best.map_or(true, |(best_len, _)| len > best_len) {
                        best = Some((len, &rule.token_type));
                    }
                }
            }

            let (len, token_type) = match best {
                Some((len, token_type)) => (len, Arc::clone(token_type)),
                None => (unknown_len(rest), Arc::clone(&self.unknown)),
            };
            tokens.push(Token::new(token_type, &rest[..len], pos));
            pos += len;
        }

        tokens
    }
}

fn unknown_len(rest: &str) -> usize {
    let word: usize = rest
        .chars()
        .take_while(|ch| ch.is_alphanumeric() || *ch == '_')
        .map(char::len_utf8)
        .sum();
    if word > 0 {
        word
    } else {
        rest.chars().next().map_or(1, char::len_utf8)
    }
}

/// Compile a built-in pattern. Patterns are literals in this crate.
pub(crate) fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("built-in token pattern is valid")
}
