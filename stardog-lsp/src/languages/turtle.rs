//! Turtle and TriG. Both report unrecognized text as lexical errors.
//! SHACL builds on the Turtle profile.

use std::sync::Arc;

use stardog_analysis::profile::{CompletionSettings, DiagnosticSettings, LanguageProfile};
use stardog_analysis::token::Category;
use stardog_grammars::{RdfSyntax, TurtleGrammar};

use super::{InitializationOptions, LanguageDefinition};

const PREFIX_KEYWORDS: [&str; 2] = ["@prefix", "prefix"];

pub(super) fn profile(language_id: &str, grammar: TurtleGrammar) -> LanguageProfile {
    let entry_rule = grammar.syntax().entry_rule();
    LanguageProfile::new(language_id, Arc::new(grammar), entry_rule)
    .with_completion(CompletionSettings {
        trigger_characters: vec!["@".to_string(), ":".to_string()],
        excluded_categories: vec![Category::Punctuator],
        allow_insertion_point: false,
        filter_by_typed_prefix: false,
    })
    .with_diagnostics(DiagnosticSettings {
        report_lexical_errors: true,
        source_hook: None,
    })
    .with_prefix_keywords(PREFIX_KEYWORDS)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TurtleLanguage;

impl LanguageDefinition for TurtleLanguage {
    fn display_name(&self) -> &'static str {
        "Turtle"
    }

    fn server_name(&self) -> &'static str {
        "turtle-language-server"
    }

    fn profile(&self, _: &InitializationOptions) -> LanguageProfile {
        profile("turtle", TurtleGrammar::new(RdfSyntax::Turtle))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrigLanguage;

impl LanguageDefinition for TrigLanguage {
    fn display_name(&self) -> &'static str {
        "TriG"
    }

    fn server_name(&self) -> &'static str {
        "trig-language-server"
    }

    fn profile(&self, _: &InitializationOptions) -> LanguageProfile {
        profile("trig", TurtleGrammar::new(RdfSyntax::TriG))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stardog_analysis::diagnostics::{collect_diagnostics, UNKNOWN_TOKEN_MESSAGE};
    use stardog_analysis::folding::{folding_regions, FoldKind};
    use stardog_analysis::grammar::parse_document;

    #[test]
    fn unknown_text_is_a_lexical_diagnostic() {
        let profile = TurtleLanguage.profile(&InitializationOptions::default());
        let text = "<urn:a> <urn:b> %% .";
        let output = parse_document(profile.grammar.as_ref(), text);
        let diagnostics = collect_diagnostics(text, &output, &profile.diagnostics);
        assert_eq!(diagnostics[0].message, UNKNOWN_TOKEN_MESSAGE);
        assert!(diagnostics.len() >= 2);
    }

    #[test]
    fn undeclared_prefix_is_reported_at_the_name() {
        let profile = TrigLanguage.profile(&InitializationOptions::default());
        let text = "<urn:g> { ex:a <urn:b> <urn:c> }";
        let output = parse_document(profile.grammar.as_ref(), text);
        let diagnostics = collect_diagnostics(text, &output, &profile.diagnostics);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Prefix \"ex:\" is not declared.");
        assert_eq!(diagnostics[0].range.start.character, 10);
        assert_eq!(diagnostics[0].range.end.character, 14);
    }

    #[test]
    fn both_prefix_forms_fold_together() {
        let profile = TurtleLanguage.profile(&InitializationOptions::default());
        let text = "@prefix a: <urn:a:> .\nPREFIX b: <urn:b:>\n<urn:s> <urn:p> <urn:o> .";
        let regions = folding_regions(text, &profile.prefix_keywords);
        assert_eq!(regions.len(), 1);
        assert_eq!((regions[0].start_line, regions[0].end_line), (0, 1));
        assert_eq!(regions[0].kind, FoldKind::Prefix);
    }
}
