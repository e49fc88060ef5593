//! SPARQL, with Stardog's extensions unless the client asks for `"w3"`.

use std::collections::HashSet;
use std::sync::Arc;

use stardog_analysis::completion::{
    Augmentation, CompletionAugmenter, CompletionContext, CompletionSuggestion,
};
use stardog_analysis::profile::{CompletionSettings, DiagnosticSettings, LanguageProfile};
use stardog_analysis::token::{Category, Token};
use stardog_grammars::rdf::{A, IRIREF, PNAME_LN, PNAME_NS};
use stardog_grammars::sparql::{ENTRY_RULE, VAR1, VAR2};
use stardog_grammars::{SparqlDialect, SparqlGrammar};
use tower_lsp::lsp_types::CompletionItemKind;

use super::{InitializationOptions, LanguageDefinition};

pub const TRIGGER_CHARACTERS: [&str; 4] = ["<", ":", "?", "$"];

/// Rules whose candidates stand for a graph edge.
const EDGE_RULES: [&str; 3] = ["Verb", "PathPrimary", "PathOneInPropertySet"];

#[derive(Debug, Clone, Copy, Default)]
pub struct SparqlLanguage;

impl LanguageDefinition for SparqlLanguage {
    fn display_name(&self) -> &'static str {
        "SPARQL"
    }

    fn server_name(&self) -> &'static str {
        "sparql-language-server"
    }

    fn profile(&self, options: &InitializationOptions) -> LanguageProfile {
        let dialect = SparqlDialect::from_option(options.grammar());
        LanguageProfile::new("sparql", Arc::new(SparqlGrammar::new(dialect)), ENTRY_RULE)
            .with_completion(CompletionSettings {
                trigger_characters: TRIGGER_CHARACTERS.iter().map(|ch| ch.to_string()).collect(),
                excluded_categories: vec![Category::Punctuator],
                allow_insertion_point: false,
                filter_by_typed_prefix: false,
            })
            .with_diagnostics(DiagnosticSettings::default())
            .with_augmenter(Arc::new(SparqlAugmenter))
            .with_prefix_keywords(["prefix"])
    }
}

/// Document identifiers ahead of the grammar's keywords, database bindings
/// after them.
#[derive(Debug, Default)]
pub struct SparqlAugmenter;

impl CompletionAugmenter for SparqlAugmenter {
    fn augment(&self, context: &CompletionContext<'_>) -> Augmentation {
        let tokens: Vec<&Token> = context.tokens_except_cursor().collect();
        let range = context.default_range.clone();
        let ranked = |expected: bool, rank: char, label: &str| {
            expected.then(|| format!("{rank}{label}"))
        };

        let mut leading = Vec::new();

        let expects_var = context.expects_type(VAR1) || context.expects_type(VAR2);
        for var in unique_images(&tokens, &[VAR1, VAR2]) {
            let mut item = CompletionSuggestion::new(var, CompletionItemKind::VARIABLE, range.clone());
            item.sort_text = ranked(expects_var, '1', var);
            leading.push(item);
        }

        let expects_prefix = context.expects_type(PNAME_NS);
        let mut prefixes: Vec<String> = unique_images(&tokens, &[PNAME_NS])
            .into_iter()
            .map(str::to_string)
            .collect();
        prefixes.extend(
            context
                .data
                .namespaces()
                .aliases()
                .map(|alias| format!("{alias}:")),
        );
        for prefix in prefixes {
            let label = prefix.strip_suffix(':').unwrap_or(&prefix).to_string();
            let mut item =
                CompletionSuggestion::new(label.clone(), CompletionItemKind::ENUM_MEMBER, range.clone());
            item.new_text = prefix.clone();
            item.sort_text = ranked(expects_prefix, '2', &label);
            leading.push(item);
        }

        for (name, images) in [
            (PNAME_LN, unique_images(&tokens, &[PNAME_LN])),
            (IRIREF, unique_images(&tokens, &[IRIREF])),
        ] {
            let expected = context.expects_type(name);
            for image in images {
                let mut item =
                    CompletionSuggestion::new(image, CompletionItemKind::ENUM_MEMBER, range.clone());
                item.sort_text = ranked(expected, '2', image);
                leading.push(item);
            }
        }

        let mut trailing = Vec::new();
        if context.in_any_rule(&EDGE_RULES) {
            trailing.extend(
                context
                    .data
                    .relationship_items()
                    .iter()
                    .map(|item| item.clone().with_range(range.clone())),
            );
        }
        if context.token_before_cursor.map_or(false, |token| token.name() == A) {
            trailing.extend(
                context
                    .data
                    .type_items()
                    .iter()
                    .map(|item| item.clone().with_range(range.clone())),
            );
        }

        Augmentation { leading, trailing }
    }
}

/// Images of tokens of the given types, first occurrence order.
fn unique_images<'a>(tokens: &[&'a Token], names: &[&str]) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .filter(|token| names.contains(&token.name()))
        .map(|token| token.image.as_str())
        .filter(|image| seen.insert(*image))
        .collect()
}
