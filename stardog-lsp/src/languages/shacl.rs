//! SHACL shapes: Turtle documents with the SHACL and XSD vocabularies on
//! hand. Undeclared prefixes are not reported; shapes graphs routinely lean
//! on `sh:` and `xsd:` without declaring them.

use std::sync::Arc;

use stardog_analysis::completion::{
    Augmentation, CompletionAugmenter, CompletionContext, CompletionSuggestion,
};
use stardog_analysis::profile::LanguageProfile;
use stardog_analysis::token::Token;
use stardog_grammars::rdf::{IRIREF, PNAME_LN, PNAME_NS};
use stardog_grammars::turtle::{SPARQL_PREFIX, TTL_PREFIX};
use stardog_grammars::{RdfSyntax, TurtleGrammar};
use tower_lsp::lsp_types::CompletionItemKind;

use super::{turtle, InitializationOptions, LanguageDefinition};

pub const SHACL_NAMESPACE: &str = "http://www.w3.org/ns/shacl#";
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

pub const TRIGGER_CHARACTERS: [&str; 2] = ["<", ":"];

/// SHACL Core and SHACL-SPARQL terms.
const SHACL_TERMS: &[&str] = &[
    // classes and instances
    "Shape",
    "NodeShape",
    "PropertyShape",
    "PropertyGroup",
    "ValidationReport",
    "ValidationResult",
    "Severity",
    "Info",
    "Warning",
    "Violation",
    "NodeKind",
    "BlankNode",
    "IRI",
    "Literal",
    "BlankNodeOrIRI",
    "BlankNodeOrLiteral",
    "IRIOrLiteral",
    "ConstraintComponent",
    "Parameter",
    "PrefixDeclaration",
    "SPARQLConstraint",
    "SPARQLAskValidator",
    "SPARQLSelectValidator",
    // targets and paths
    "targetClass",
    "targetNode",
    "targetObjectsOf",
    "targetSubjectsOf",
    "path",
    "inversePath",
    "alternativePath",
    "zeroOrMorePath",
    "oneOrMorePath",
    "zeroOrOnePath",
    // constraints
    "class",
    "datatype",
    "nodeKind",
    "minCount",
    "maxCount",
    "minExclusive",
    "minInclusive",
    "maxExclusive",
    "maxInclusive",
    "minLength",
    "maxLength",
    "pattern",
    "flags",
    "languageIn",
    "uniqueLang",
    "equals",
    "disjoint",
    "lessThan",
    "lessThanOrEquals",
    "not",
    "and",
    "or",
    "xone",
    "node",
    "property",
    "qualifiedValueShape",
    "qualifiedValueShapesDisjoint",
    "qualifiedMinCount",
    "qualifiedMaxCount",
    "closed",
    "ignoredProperties",
    "hasValue",
    "in",
    // non-validating
    "name",
    "description",
    "order",
    "group",
    "defaultValue",
    "severity",
    "message",
    "deactivated",
    // SHACL-SPARQL
    "sparql",
    "select",
    "ask",
    "prefixes",
    "declare",
    "prefix",
    "namespace",
    // results
    "conforms",
    "result",
    "focusNode",
    "resultPath",
    "resultSeverity",
    "resultMessage",
    "sourceConstraintComponent",
    "sourceShape",
    "value",
    "shapesGraph",
];

const XSD_TERMS: &[&str] = &[
    "string",
    "boolean",
    "decimal",
    "integer",
    "double",
    "float",
    "date",
    "dateTime",
    "time",
    "duration",
    "anyURI",
    "long",
    "int",
    "short",
    "byte",
    "nonNegativeInteger",
    "positiveInteger",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ShaclLanguage;

impl LanguageDefinition for ShaclLanguage {
    fn display_name(&self) -> &'static str {
        "SHACL"
    }

    fn server_name(&self) -> &'static str {
        "shacl-language-server"
    }

    fn profile(&self, _: &InitializationOptions) -> LanguageProfile {
        let grammar = TurtleGrammar::new(RdfSyntax::Turtle).without_prefix_checks();
        let mut profile = turtle::profile("shacl", grammar).with_augmenter(Arc::new(ShaclAugmenter));
        profile.completion.trigger_characters =
            TRIGGER_CHARACTERS.iter().map(|ch| ch.to_string()).collect();
        profile
    }
}

/// Offers the SHACL and XSD terms wherever a prefixed name fits, under the
/// prefixes the document binds them to (`sh:` and `xsd:` otherwise).
#[derive(Debug, Default)]
pub struct ShaclAugmenter;

impl CompletionAugmenter for ShaclAugmenter {
    fn augment(&self, context: &CompletionContext<'_>) -> Augmentation {
        if !context.expects_type(PNAME_LN) {
            return Augmentation::default();
        }
        let tokens: Vec<&Token> = context.tokens_except_cursor().collect();
        let shacl = declared_prefix(&tokens, SHACL_NAMESPACE).unwrap_or("sh:");
        let xsd = declared_prefix(&tokens, XSD_NAMESPACE).unwrap_or("xsd:");

        let mut leading = Vec::with_capacity(SHACL_TERMS.len() + XSD_TERMS.len());
        let shacl_terms = SHACL_TERMS
            .iter()
            .map(|local| (shacl, SHACL_NAMESPACE, *local, shacl_kind(local)));
        let xsd_terms = XSD_TERMS
            .iter()
            .map(|local| (xsd, XSD_NAMESPACE, *local, CompletionItemKind::CLASS));
        for (prefix, namespace, local, kind) in shacl_terms.chain(xsd_terms) {
            leading.push(
                CompletionSuggestion::new(format!("{prefix}{local}"), kind, context.default_range.clone())
                    .with_detail(format!("{namespace}{local}")),
            );
        }

        Augmentation {
            leading,
            trailing: Vec::new(),
        }
    }
}

/// SHACL classes and instances start upper case, properties lower case.
fn shacl_kind(local: &str) -> CompletionItemKind {
    if local.starts_with(|ch: char| ch.is_ascii_uppercase()) {
        CompletionItemKind::CLASS
    } else {
        CompletionItemKind::PROPERTY
    }
}

/// Last prefix the document binds to `namespace`, colon included.
fn declared_prefix<'a>(tokens: &[&'a Token], namespace: &str) -> Option<&'a str> {
    tokens
        .windows(3)
        .rev()
        .find(|window| {
            matches!(window[0].name(), TTL_PREFIX | SPARQL_PREFIX)
                && window[1].name() == PNAME_NS
                && window[2].name() == IRIREF
                && window[2].image.strip_prefix('<').and_then(|iri| iri.strip_suffix('>'))
                    == Some(namespace)
        })
        .map(|window| window[1].image.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stardog_analysis::completion::completions;
    use stardog_analysis::completion_data::CompletionData;
    use stardog_analysis::diagnostics::collect_diagnostics;
    use stardog_analysis::grammar::parse_document;

    fn complete(text: &str) -> Vec<CompletionSuggestion> {
        let profile = ShaclLanguage.profile(&InitializationOptions::default());
        let output = parse_document(profile.grammar.as_ref(), text);
        completions(&profile, text, &output.tokens, text.len(), &CompletionData::new())
    }

    fn labels(items: &[CompletionSuggestion]) -> Vec<&str> {
        items.iter().map(|item| item.label.as_str()).collect()
    }

    #[test]
    fn shacl_terms_complete_in_predicate_position() {
        let text = "@prefix sh: <http://www.w3.org/ns/shacl#> .\n<urn:PersonShape> sh:";
        let items = complete(text);
        let labels = labels(&items);
        assert!(labels.contains(&"sh:targetClass"), "{labels:?}");
        assert!(labels.contains(&"xsd:string"));

        let min_count = items.iter().find(|item| item.label == "sh:minCount").unwrap();
        assert_eq!(min_count.kind, CompletionItemKind::PROPERTY);
        assert_eq!(min_count.detail.as_deref(), Some("http://www.w3.org/ns/shacl#minCount"));
        assert_eq!(min_count.replace, text.len() - 3..text.len());

        let node_shape = items.iter().find(|item| item.label == "sh:NodeShape").unwrap();
        assert_eq!(node_shape.kind, CompletionItemKind::CLASS);
    }

    #[test]
    fn documents_choose_the_prefix() {
        let text = "@prefix shape: <http://www.w3.org/ns/shacl#> .\n\
                    PREFIX x: <http://www.w3.org/2001/XMLSchema#>\n\
                    <urn:s> shape:";
        let items = complete(text);
        let labels = labels(&items);
        assert!(labels.contains(&"shape:property"));
        assert!(labels.contains(&"x:dateTime"));
        assert!(!labels.contains(&"sh:property"));
        assert!(!labels.contains(&"xsd:dateTime"));
    }

    #[test]
    fn nothing_is_added_where_no_prefixed_name_fits() {
        // after `@prefix` only a namespace label may follow
        let text = "@prefix sh:";
        let labels_after_prefix = labels(&complete(text)).join(" ");
        assert!(!labels_after_prefix.contains("sh:minCount"), "{labels_after_prefix}");
    }

    #[test]
    fn undeclared_prefixes_are_not_reported() {
        let profile = ShaclLanguage.profile(&InitializationOptions::default());
        let text = "ex:PersonShape a sh:NodeShape ;\n  sh:targetClass ex:Person .";
        let output = parse_document(profile.grammar.as_ref(), text);
        assert!(collect_diagnostics(text, &output, &profile.diagnostics).is_empty());
    }

    #[test]
    fn profile_reuses_turtle() {
        let profile = ShaclLanguage.profile(&InitializationOptions::default());
        assert_eq!(profile.language_id, "shacl");
        assert_eq!(profile.entry_rule, "turtleDoc");
        assert_eq!(profile.completion.trigger_characters, ["<", ":"]);
        assert!(profile.diagnostics.report_lexical_errors);
        assert_eq!(profile.prefix_keywords, ["@prefix", "prefix"]);
    }
}
