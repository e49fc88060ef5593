//! GraphQL, with Stardog's directives unless the client asks for
//! `"standard"`.

use std::sync::Arc;

use stardog_analysis::profile::{CompletionSettings, DiagnosticSettings, LanguageProfile};
use stardog_analysis::token::Category;
use stardog_grammars::graphql::ENTRY_RULE;
use stardog_grammars::{GraphQlDialect, GraphQlGrammar};

use super::{InitializationOptions, LanguageDefinition};

pub const TRIGGER_CHARACTERS: [&str; 2] = ["$", "@"];

#[derive(Debug, Clone, Copy, Default)]
pub struct GraphQlLanguage;

impl LanguageDefinition for GraphQlLanguage {
    fn display_name(&self) -> &'static str {
        "GraphQL"
    }

    fn server_name(&self) -> &'static str {
        "graphql-language-server"
    }

    fn profile(&self, options: &InitializationOptions) -> LanguageProfile {
        let dialect = GraphQlDialect::from_option(options.grammar());
        LanguageProfile::new("graphql", Arc::new(GraphQlGrammar::new(dialect)), ENTRY_RULE)
            .with_completion(CompletionSettings {
                trigger_characters: TRIGGER_CHARACTERS.iter().map(|ch| ch.to_string()).collect(),
                excluded_categories: vec![Category::Punctuator],
                // completion also works between tokens, and narrows to the
                // name being typed
                allow_insertion_point: true,
                filter_by_typed_prefix: true,
            })
            .with_diagnostics(DiagnosticSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stardog_analysis::completion::{completions, CompletionSuggestion};
    use stardog_analysis::completion_data::CompletionData;
    use stardog_analysis::grammar::parse_document;

    fn complete(options: &InitializationOptions, text: &str, offset: usize) -> Vec<CompletionSuggestion> {
        let profile = GraphQlLanguage.profile(options);
        let output = parse_document(profile.grammar.as_ref(), text);
        completions(&profile, text, &output.tokens, offset, &CompletionData::new())
    }

    fn labels(items: &[CompletionSuggestion]) -> Vec<&str> {
        items.iter().map(|item| item.label.as_str()).collect()
    }

    #[test]
    fn offers_operations_at_an_insertion_point() {
        let items = complete(&InitializationOptions::default(), "", 0);
        let labels = labels(&items);
        assert!(labels.contains(&"query"));
        assert!(labels.contains(&"fragment"));
        assert!(!labels.contains(&"{"));
        assert!(items.iter().all(|item| item.replace == (0..0)));
    }

    #[test]
    fn narrows_to_the_word_being_typed() {
        let text = "{ Human } qu";
        let items = complete(&InitializationOptions::default(), text, text.len());
        assert_eq!(labels(&items), ["query"]);
        assert_eq!(items[0].replace, 10..12);
    }

    #[test]
    fn directive_category_expands_to_each_directive() {
        let text = "{ Human @";
        let items = complete(&InitializationOptions::default(), text, text.len());
        let optional = items.iter().find(|item| item.label == "@optional").unwrap();
        assert_eq!(optional.replace, 8..9);
        assert!(labels(&items).contains(&"@hide"));
    }

    #[test]
    fn standard_grammar_has_no_stardog_directives() {
        let options = InitializationOptions {
            grammar: Some("standard".into()),
        };
        let text = "{ Human @";
        let items = complete(&options, text, text.len());
        assert!(!labels(&items).contains(&"@optional"));
    }
}
