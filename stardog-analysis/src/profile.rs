//! Per-language capability record.
//!
//! A [`LanguageProfile`] is everything the engine needs to serve one
//! language: the grammar, where content assist starts, how completion and
//! diagnostics behave, and the optional hooks. Languages differ only in the
//! profile they build, never in server code.

use std::fmt;
use std::sync::Arc;

use crate::completion::CompletionAugmenter;
use crate::grammar::{Grammar, SyntaxError};
use crate::token::Category;

/// Chooses the `source` of a syntax diagnostic.
pub type DiagnosticSourceHook = Arc<dyn Fn(&SyntaxError) -> Option<String> + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct CompletionSettings {
    pub trigger_characters: Vec<String>,
    /// Candidates tagged with any of these are never offered.
    pub excluded_categories: Vec<Category>,
    /// Complete at a cursor that touches no token, inserting at the cursor.
    pub allow_insertion_point: bool,
    /// Narrow grammar candidates to the word typed so far.
    pub filter_by_typed_prefix: bool,
}

#[derive(Clone, Default)]
pub struct DiagnosticSettings {
    /// Report tokens the lexer could not recognize.
    pub report_lexical_errors: bool,
    pub source_hook: Option<DiagnosticSourceHook>,
}

impl fmt::Debug for DiagnosticSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticSettings")
            .field("report_lexical_errors", &self.report_lexical_errors)
            .field("source_hook", &self.source_hook.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub struct LanguageProfile {
    pub language_id: String,
    pub grammar: Arc<dyn Grammar>,
    pub entry_rule: String,
    pub completion: CompletionSettings,
    pub diagnostics: DiagnosticSettings,
    pub augmenter: Option<Arc<dyn CompletionAugmenter>>,
    /// Line-leading keywords whose runs fold together.
    pub prefix_keywords: Vec<String>,
}

impl LanguageProfile {
    pub fn new(
        language_id: impl Into<String>,
        grammar: Arc<dyn Grammar>,
        entry_rule: impl Into<String>,
    ) -> Self {
        Self {
            language_id: language_id.into(),
            grammar,
            entry_rule: entry_rule.into(),
            completion: CompletionSettings::default(),
            diagnostics: DiagnosticSettings::default(),
            augmenter: None,
            prefix_keywords: Vec::new(),
        }
    }

    pub fn with_completion(mut self, completion: CompletionSettings) -> Self {
        self.completion = completion;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: DiagnosticSettings) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_augmenter(mut self, augmenter: Arc<dyn CompletionAugmenter>) -> Self {
        self.augmenter = Some(augmenter);
        self
    }

    pub fn with_prefix_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Debug for LanguageProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageProfile")
            .field("language_id", &self.language_id)
            .field("entry_rule", &self.entry_rule)
            .field("completion", &self.completion)
            .field("diagnostics", &self.diagnostics)
            .field("augmenter", &self.augmenter.is_some())
            .field("prefix_keywords", &self.prefix_keywords)
            .finish()
    }
}
