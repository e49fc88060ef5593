//! Cursor-aware completion.
//!
//! The engine locates the token the cursor is in (or just after), asks the
//! grammar which token types could come next, adds longer keyword
//! alternatives for a word split across two tokens, lets the language's
//! augmenter contribute document and database vocabulary, and turns all of
//! it into replacement edits. Results are byte ranges; the server converts
//! them to LSP positions.
//!
//! Final order is: augmenter leading items, grammar candidates, augmenter
//! trailing items. Labels are unique, first occurrence wins.

use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

use lsp_types::CompletionItemKind;
use regex::Regex;

use crate::completion_data::CompletionData;
use crate::grammar::CompletionCandidate;
use crate::position::find_token_index_at;
use crate::profile::{CompletionSettings, LanguageProfile};
use crate::token::{normalize_keyword, Token, TokenPattern, TokenType};

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSuggestion {
    pub label: String,
    pub kind: CompletionItemKind,
    pub new_text: String,
    /// Byte range replaced by `new_text`.
    pub replace: Range<usize>,
    pub sort_text: Option<String>,
    pub filter_text: Option<String>,
    pub detail: Option<String>,
}

impl CompletionSuggestion {
    pub fn new(label: impl Into<String>, kind: CompletionItemKind, replace: Range<usize>) -> Self {
        let label = label.into();
        Self {
            new_text: label.clone(),
            label,
            kind,
            replace,
            sort_text: None,
            filter_text: None,
            detail: None,
        }
    }

    pub fn with_sort_text(mut self, sort_text: impl Into<String>) -> Self {
        self.sort_text = Some(sort_text.into());
        self
    }

    pub fn with_filter_text(mut self, filter_text: impl Into<String>) -> Self {
        self.filter_text = Some(filter_text.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_range(mut self, replace: Range<usize>) -> Self {
        self.replace = replace;
        self
    }
}

/// Everything an augmenter may look at.
pub struct CompletionContext<'a> {
    pub text: &'a str,
    pub tokens: &'a [Token],
    pub offset: usize,
    pub token_at_cursor: Option<&'a Token>,
    pub token_before_cursor: Option<&'a Token>,
    pub candidates: &'a [CompletionCandidate],
    /// Range a suggestion replaces unless it says otherwise.
    pub default_range: Range<usize>,
    pub data: &'a CompletionData,
}

impl<'a> CompletionContext<'a> {
    /// Document tokens other than the one being typed.
    pub fn tokens_except_cursor(&self) -> impl Iterator<Item = &'a Token> + '_ {
        self.tokens.iter().filter(move |token| {
            self.token_at_cursor
                .map_or(true, |at| !std::ptr::eq(*token, at))
        })
    }

    /// True when some candidate expects a token of type `name`.
    pub fn expects_type(&self, name: &str) -> bool {
        self.candidates
            .iter()
            .any(|candidate| candidate.next_token_type.name == name)
    }

    /// True when some candidate's rule stack contains one of `rules`.
    pub fn in_any_rule(&self, rules: &[&str]) -> bool {
        self.candidates
            .iter()
            .any(|candidate| rules.iter().any(|rule| candidate.in_rule(rule)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Augmentation {
    pub leading: Vec<CompletionSuggestion>,
    pub trailing: Vec<CompletionSuggestion>,
}

/// Language-specific completion vocabulary.
pub trait CompletionAugmenter: Send + Sync {
    fn augment(&self, context: &CompletionContext<'_>) -> Augmentation;
}

/// Completions at byte `offset` of `text`, given the document's tokens.
pub fn completions(
    profile: &LanguageProfile,
    text: &str,
    tokens: &[Token],
    offset: usize,
    data: &CompletionData,
) -> Vec<CompletionSuggestion> {
    let offset = offset.min(text.len());
    let settings = &profile.completion;

    let Some(cursor) = locate_cursor(tokens, offset, settings) else {
        return Vec::new();
    };

    let grammar = profile.grammar.as_ref();
    let mut candidates = grammar.content_assist(&profile.entry_rule, &tokens[..cursor.vector_end]);

    if let (Some(before), Some(at)) = (cursor.before, cursor.at) {
        if tokens[before].abuts(&tokens[at]) {
            candidates.extend(longer_alternatives(
                grammar.vocabulary(),
                &tokens[before],
                &tokens[at],
            ));
        }
    }

    let context = CompletionContext {
        text,
        tokens,
        offset,
        token_at_cursor: cursor.at.map(|idx| &tokens[idx]),
        token_before_cursor: cursor.before.map(|idx| &tokens[idx]),
        candidates: &candidates,
        default_range: cursor.range.clone(),
        data,
    };
    let augmentation = profile
        .augmenter
        .as_ref()
        .map(|augmenter| augmenter.augment(&context))
        .unwrap_or_default();

    let typed = cursor.typed_prefix.and_then(|range| text.get(range));
    let mut items = Vec::new();
    for candidate in &candidates {
        let range = candidate
            .replacement_range
            .clone()
            .unwrap_or_else(|| cursor.range.clone());
        candidate_items(
            &candidate.next_token_type,
            range,
            settings,
            grammar.vocabulary(),
            &mut items,
        );
    }
    if let Some(typed) = typed.filter(|typed| !typed.is_empty()) {
        items.retain(|item| item.label.starts_with(typed));
    }

    let len = text.len();
    let mut seen = HashSet::new();
    augmentation
        .leading
        .into_iter()
        .chain(items)
        .chain(augmentation.trailing)
        .filter(|item| seen.insert(item.label.clone()))
        .map(|mut item| {
            item.replace = clamp(item.replace, len);
            item
        })
        .collect()
}

struct Cursor {
    /// Index of the token at the cursor.
    at: Option<usize>,
    /// Index of the token right before the cursor token or insertion point.
    before: Option<usize>,
    /// Tokens `[..vector_end]` are handed to content assist.
    vector_end: usize,
    range: Range<usize>,
    /// Text already typed for the word at the cursor, when candidates should
    /// be narrowed to it.
    typed_prefix: Option<Range<usize>>,
}

fn locate_cursor(tokens: &[Token], offset: usize, settings: &CompletionSettings) -> Option<Cursor> {
    match find_token_index_at(tokens, offset) {
        Some(at) => {
            let token = &tokens[at];
            let before = at.checked_sub(1);
            let mut cursor = Cursor {
                at: Some(at),
                before,
                vector_end: at,
                range: token.start_offset..token.end(),
                typed_prefix: None,
            };
            // A word split across two abutting tokens is still being typed.
            if let Some(prev) = before.map(|idx| &tokens[idx]) {
                if prev.abuts(token) && prev.is_word_like() && token.is_word_like() {
                    cursor.vector_end = at - 1;
                    cursor.range.start = prev.start_offset;
                }
            }
            if settings.filter_by_typed_prefix && token.is_word_like() && offset == token.end() {
                cursor.typed_prefix = Some(cursor.range.start..offset);
            }
            Some(cursor)
        }
        None if settings.allow_insertion_point => {
            let vector_end = tokens.partition_point(|token| token.start_offset < offset);
            Some(Cursor {
                at: None,
                before: vector_end.checked_sub(1),
                vector_end,
                range: offset..offset,
                typed_prefix: None,
            })
        }
        None => None,
    }
}

/// Vocabulary entries whose text extends the concatenation of two abutting
/// tokens, e.g. `str` + `s` toward `strstarts`. Prefix match only.
fn longer_alternatives(
    vocabulary: &[Arc<TokenType>],
    before: &Token,
    at: &Token,
) -> Vec<CompletionCandidate> {
    let combined = format!("{}{}", before.image, at.image);
    let lowered = combined.to_lowercase();
    vocabulary
        .iter()
        .filter(|ty| match &ty.pattern {
            TokenPattern::Literal(text) => text.starts_with(&combined),
            TokenPattern::Keyword(text) => normalize_keyword(text).to_lowercase().starts_with(&lowered),
            TokenPattern::Regex(regex) => regex_source_starts_with(regex, &combined, &lowered),
            TokenPattern::Custom | TokenPattern::NotApplicable(_) => false,
        })
        .map(|ty| CompletionCandidate {
            next_token_type: Arc::clone(ty),
            rule_stack: Vec::new(),
            replacement_range: Some(before.start_offset..at.end()),
        })
        .collect()
}

/// Compares against the pattern's source text; a leading `(?i)` makes the
/// comparison case-insensitive.
fn regex_source_starts_with(regex: &Regex, combined: &str, lowered: &str) -> bool {
    let source = regex.as_str();
    match source.strip_prefix("(?i)") {
        Some(rest) => rest.starts_with(combined) || rest.to_lowercase().starts_with(lowered),
        None => source.starts_with(combined),
    }
}

fn candidate_items(
    token_type: &TokenType,
    range: Range<usize>,
    settings: &CompletionSettings,
    vocabulary: &[Arc<TokenType>],
    out: &mut Vec<CompletionSuggestion>,
) {
    if settings
        .excluded_categories
        .iter()
        .any(|category| token_type.is(*category))
    {
        return;
    }
    match &token_type.pattern {
        TokenPattern::Literal(text) => {
            out.push(CompletionSuggestion::new(text.clone(), CompletionItemKind::ENUM_MEMBER, range));
        }
        TokenPattern::Keyword(text) => {
            out.push(CompletionSuggestion::new(
                normalize_keyword(text),
                CompletionItemKind::KEYWORD,
                range,
            ));
        }
        TokenPattern::NotApplicable(category) => {
            for member in vocabulary.iter().filter(|member| {
                member.is(*category) && !matches!(member.pattern, TokenPattern::NotApplicable(_))
            }) {
                candidate_items(member, range.clone(), settings, vocabulary, out);
            }
        }
        TokenPattern::Regex(_) | TokenPattern::Custom => {
            tracing::trace!(token_type = %token_type.name, "skipping non-literal completion candidate");
        }
    }
}

fn clamp(range: Range<usize>, len: usize) -> Range<usize> {
    let start = range.start.min(len);
    let end = range.end.min(len).max(start);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::CstNode;
    use crate::grammar::{Grammar, ParseOutput};
    use crate::token::Category;
    use regex::Regex;

    /// Splits on spaces; content assist answers from a fixed table keyed by
    /// the number of tokens before the cursor.
    struct TableGrammar {
        vocabulary: Vec<Arc<TokenType>>,
        word: Arc<TokenType>,
    }

    impl TableGrammar {
        fn new() -> Self {
            let vocabulary = vec![
                Arc::new(TokenType::keyword("SELECT", "select")),
                Arc::new(TokenType::keyword("STR", "str").with_categories(&[Category::BuiltInCall])),
                Arc::new(
                    TokenType::keyword("STRSTARTS", "strstarts")
                        .with_categories(&[Category::BuiltInCall]),
                ),
                Arc::new(TokenType::literal("LCurly", "{").with_categories(&[Category::Punctuator])),
                Arc::new(TokenType::literal("Star", "*")),
                Arc::new(TokenType::regex("VAR1", Regex::new(r"\?\w+").unwrap())),
                Arc::new(TokenType::category("BuiltInCall", Category::BuiltInCall)),
            ];
            Self {
                vocabulary,
                word: Arc::new(TokenType::regex("Word", Regex::new(r"\w+").unwrap())),
            }
        }

        fn ty(&self, name: &str) -> Arc<TokenType> {
            self.vocabulary
                .iter()
                .find(|ty| ty.name == name)
                .cloned()
                .unwrap()
        }

        fn lex(&self, text: &str) -> Vec<Token> {
            let mut tokens = Vec::new();
            let mut offset = 0;
            for part in text.split(' ') {
                if !part.is_empty() {
                    tokens.push(Token::new(self.word.clone(), part, offset));
                }
                offset += part.len() + 1;
            }
            tokens
        }
    }

    impl Grammar for TableGrammar {
        fn parse(&self, text: &str) -> ParseOutput {
            ParseOutput {
                cst: CstNode::rule("Doc", vec![]),
                tokens: self.lex(text),
                errors: vec![],
                semantic_errors: vec![],
                escapes: None,
            }
        }

        fn content_assist(&self, _start_rule: &str, tokens: &[Token]) -> Vec<CompletionCandidate> {
            let names: &[&str] = match tokens.len() {
                0 => &["SELECT", "SELECT", "VAR1"],
                1 => &["Star", "LCurly", "BuiltInCall"],
                _ => &[],
            };
            names
                .iter()
                .map(|name| CompletionCandidate::new(self.ty(name), vec!["Doc".into()]))
                .collect()
        }

        fn vocabulary(&self) -> &[Arc<TokenType>] {
            &self.vocabulary
        }
    }

    struct Variables;

    impl CompletionAugmenter for Variables {
        fn augment(&self, context: &CompletionContext<'_>) -> Augmentation {
            Augmentation {
                leading: context
                    .tokens_except_cursor()
                    .filter(|token| token.image.starts_with('?'))
                    .map(|token| {
                        CompletionSuggestion::new(
                            token.image.clone(),
                            CompletionItemKind::VARIABLE,
                            context.default_range.clone(),
                        )
                    })
                    .collect(),
                trailing: vec![CompletionSuggestion::new(
                    "select",
                    CompletionItemKind::TEXT,
                    0..0,
                )],
            }
        }
    }

    fn profile(settings: CompletionSettings) -> LanguageProfile {
        LanguageProfile::new("test", Arc::new(TableGrammar::new()), "Doc").with_completion(settings)
    }

    fn run(profile: &LanguageProfile, text: &str, offset: usize) -> Vec<CompletionSuggestion> {
        let tokens = profile.grammar.parse(text).tokens;
        completions(profile, text, &tokens, offset, &CompletionData::new())
    }

    #[test]
    fn replaces_the_token_at_the_cursor() {
        let profile = profile(CompletionSettings::default());
        let items = run(&profile, "sel ?x", 3);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "select");
        assert_eq!(items[0].kind, CompletionItemKind::KEYWORD);
        assert_eq!(items[0].replace, 0..3);
    }

    #[test]
    fn no_token_and_no_insertion_point_means_no_completions() {
        let profile = profile(CompletionSettings::default());
        assert!(run(&profile, "a   b", 2).is_empty());
    }

    #[test]
    fn insertion_point_uses_an_empty_range_at_the_cursor() {
        let profile = profile(CompletionSettings {
            allow_insertion_point: true,
            ..CompletionSettings::default()
        });
        let items = run(&profile, "a   b", 2);
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["*", "{", "str", "strstarts"]);
        assert!(items.iter().all(|item| item.replace == (2..2)));
    }

    #[test]
    fn excluded_categories_and_regex_types_are_dropped() {
        let profile = profile(CompletionSettings {
            allow_insertion_point: true,
            excluded_categories: vec![Category::Punctuator],
            ..CompletionSettings::default()
        });
        let labels: Vec<_> = run(&profile, "a   b", 2).into_iter().map(|i| i.label).collect();
        assert_eq!(labels, ["*", "str", "strstarts"]);
    }

    #[test]
    fn abutting_tokens_gain_longer_alternatives() {
        let profile = profile(CompletionSettings::default());
        let text = "strs";
        let grammar = TableGrammar::new();
        let tokens = vec![
            Token::new(grammar.ty("STR"), "str", 0),
            Token::new(grammar.word.clone(), "s", 3),
        ];
        let items = completions(&profile, text, &tokens, 4, &CompletionData::new());
        let strstarts = items.iter().find(|item| item.label == "strstarts").unwrap();
        assert_eq!(strstarts.replace, 0..4);
        // the split word is excluded from the prefix, so document-start keywords
        // replace both halves
        let select = items.iter().find(|item| item.label == "select").unwrap();
        assert_eq!(select.replace, 0..4);
    }

    #[test]
    fn longer_alternatives_match_regex_sources() {
        let vocabulary = vec![
            Arc::new(TokenType::regex("STRLEN", Regex::new("(?i)strlen").unwrap())),
            Arc::new(TokenType::regex("StrDt", Regex::new("STRDT").unwrap())),
            Arc::new(TokenType::regex("VAR1", Regex::new(r"\?\w+").unwrap())),
        ];
        let word = TableGrammar::new().word;
        let before = Token::new(word.clone(), "STR", 0);
        let names = |at: &str| -> Vec<String> {
            let at = Token::new(word.clone(), at, 3);
            longer_alternatives(&vocabulary, &before, &at)
                .into_iter()
                .map(|candidate| {
                    assert_eq!(candidate.replacement_range, Some(0..3 + at.image.len()));
                    candidate.next_token_type.name.clone()
                })
                .collect()
        };
        assert_eq!(names("L"), ["STRLEN"]);
        assert_eq!(names("D"), ["StrDt"]);
        // only the flagged pattern ignores case
        let before = Token::new(word.clone(), "str", 0);
        let at = Token::new(word.clone(), "d", 3);
        assert!(longer_alternatives(&vocabulary, &before, &at).is_empty());
        let at = Token::new(word.clone(), "l", 3);
        assert_eq!(longer_alternatives(&vocabulary, &before, &at).len(), 1);
    }

    #[test]
    fn augmentation_wraps_candidates_and_labels_stay_unique() {
        let profile = profile(CompletionSettings::default())
            .with_augmenter(Arc::new(Variables));
        let items = run(&profile, "select ?a ?b ?a", 3);
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["?a", "?b", "select"]);
        assert_eq!(items[0].kind, CompletionItemKind::VARIABLE);
        assert_eq!(items[0].replace, 0..6);
        assert_eq!(items[2].kind, CompletionItemKind::KEYWORD);
    }

    #[test]
    fn typed_prefix_narrows_grammar_candidates() {
        let profile = profile(CompletionSettings {
            filter_by_typed_prefix: true,
            ..CompletionSettings::default()
        });
        let labels: Vec<_> = run(&profile, "x st", 4).into_iter().map(|i| i.label).collect();
        assert_eq!(labels, ["str", "strstarts"]);
    }

    #[test]
    fn ranges_are_clamped_to_the_document() {
        let profile = profile(CompletionSettings::default());
        let tokens = vec![Token::new(TableGrammar::new().word.clone(), "select", 0)];
        let items = completions(&profile, "sel", &tokens, 3, &CompletionData::new());
        assert!(items.iter().all(|item| item.replace.end <= 3));
    }
}
