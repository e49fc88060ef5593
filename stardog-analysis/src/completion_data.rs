//! Externally supplied completion data: namespaces and binding statistics.
//!
//! Clients push this out of band through `$/didUpdateCompletionData`. The
//! server owns one [`CompletionData`] and only that notification's handler
//! writes to it; completion augmentation reads it.

use std::collections::BTreeMap;

use lsp_types::CompletionItemKind;
use serde::Deserialize;
use serde_json::Value;

use crate::completion::CompletionSuggestion;
use crate::namespaces::NamespaceMap;

/// Added to sort keys so that higher counts produce smaller keys.
pub const SORT_BASE: u64 = 100_000_000_000_000;

/// An IRI and how often it occurs in the target database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub iri: String,
    pub count: u64,
}

/// Payload of `$/didUpdateCompletionData`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionDataUpdate {
    #[serde(default)]
    pub namespaces: Option<Vec<String>>,
    #[serde(default)]
    pub namespace_map: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub relationship_bindings: Option<Vec<RelationshipBinding>>,
    #[serde(default)]
    pub type_bindings: Option<Vec<TypeBinding>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationshipBinding {
    pub relationship: BindingValue,
    pub count: BindingValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeBinding {
    #[serde(rename = "type")]
    pub type_iri: BindingValue,
    pub count: BindingValue,
}

/// A SPARQL JSON results cell; only `value` is used.
#[derive(Debug, Clone, Deserialize)]
pub struct BindingValue {
    pub value: Value,
}

impl BindingValue {
    fn text(&self) -> String {
        match &self.value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    fn count(&self) -> u64 {
        match &self.value {
            Value::Number(number) => number.as_u64().unwrap_or(0),
            Value::String(text) => text.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

impl From<&RelationshipBinding> for Binding {
    fn from(binding: &RelationshipBinding) -> Self {
        Binding {
            iri: binding.relationship.text(),
            count: binding.count.count(),
        }
    }
}

impl From<&TypeBinding> for Binding {
    fn from(binding: &TypeBinding) -> Self {
        Binding {
            iri: binding.type_iri.text(),
            count: binding.count.count(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompletionData {
    namespaces: NamespaceMap,
    relationship_bindings: Vec<Binding>,
    type_bindings: Vec<Binding>,
    relationship_items: Vec<CompletionSuggestion>,
    type_items: Vec<CompletionSuggestion>,
}

impl CompletionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    /// Relationship items, without a replacement range.
    pub fn relationship_items(&self) -> &[CompletionSuggestion] {
        &self.relationship_items
    }

    /// Type items, without a replacement range.
    pub fn type_items(&self) -> &[CompletionSuggestion] {
        &self.type_items
    }

    /// Apply an update. Binding items always reflect the newest namespaces,
    /// whichever order namespaces and bindings arrive in.
    pub fn apply(&mut self, update: CompletionDataUpdate) {
        let mut namespaces_changed = false;
        if let Some(rows) = update.namespaces {
            self.namespaces = NamespaceMap::from_rows(rows);
            namespaces_changed = true;
        } else if let Some(map) = update.namespace_map {
            self.namespaces = map.into_iter().collect();
            namespaces_changed = true;
        }

        if let Some(bindings) = update.relationship_bindings {
            self.relationship_bindings = bindings.iter().map(Binding::from).collect();
            self.relationship_items = binding_items(&self.namespaces, &self.relationship_bindings);
        } else if namespaces_changed {
            self.relationship_items = binding_items(&self.namespaces, &self.relationship_bindings);
        }

        if let Some(bindings) = update.type_bindings {
            self.type_bindings = bindings.iter().map(Binding::from).collect();
            self.type_items = binding_items(&self.namespaces, &self.type_bindings);
        } else if namespaces_changed {
            self.type_items = binding_items(&self.namespaces, &self.type_bindings);
        }
    }
}

/// Full-IRI items for every binding, followed by prefixed items for those a
/// namespace abbreviates. Higher counts sort first; prefixed before full.
pub fn binding_items(namespaces: &NamespaceMap, bindings: &[Binding]) -> Vec<CompletionSuggestion> {
    let mut full = Vec::with_capacity(bindings.len());
    let mut prefixed = Vec::new();

    for Binding { iri, count } in bindings {
        let rank = SORT_BASE.saturating_sub(*count);
        let detail = format!("{count} occurrences");

        if let Some(short) = namespaces.abbreviate(iri).filter(|short| short != iri) {
            prefixed.push(
                CompletionSuggestion::new(short.clone(), CompletionItemKind::FIELD, 0..0)
                    .with_sort_text(format!("00{rank}{short}"))
                    .with_filter_text(format!("<{iri}>{short}"))
                    .with_detail(detail.clone()),
            );
        }
        full.push(
            CompletionSuggestion::new(format!("<{iri}>"), CompletionItemKind::ENUM_MEMBER, 0..0)
                .with_sort_text(format!("01{rank}{iri}"))
                .with_detail(detail),
        );
    }

    full.extend(prefixed);
    full
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(value: Value) -> CompletionDataUpdate {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn builds_full_then_prefixed_items() {
        let namespaces = NamespaceMap::from_rows(["ex=http://example.org/"]);
        let items = binding_items(
            &namespaces,
            &[
                Binding {
                    iri: "http://example.org/knows".into(),
                    count: 7,
                },
                Binding {
                    iri: "http://other.org/likes".into(),
                    count: 3,
                },
            ],
        );
        let labels: Vec<_> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(
            labels,
            ["<http://example.org/knows>", "<http://other.org/likes>", "ex:knows"]
        );
        assert_eq!(
            items[0].sort_text.as_deref(),
            Some("0199999999999993http://example.org/knows")
        );
        assert_eq!(items[2].sort_text.as_deref(), Some("0099999999999993ex:knows"));
        assert_eq!(
            items[2].filter_text.as_deref(),
            Some("<http://example.org/knows>ex:knows")
        );
        assert_eq!(items[2].detail.as_deref(), Some("7 occurrences"));
        assert_eq!(items[2].kind, CompletionItemKind::FIELD);
    }

    #[test]
    fn namespaces_arriving_after_bindings_rebuild_items() {
        let mut data = CompletionData::new();
        data.apply(update(json!({
            "relationshipBindings": [
                { "relationship": { "value": "http://example.org/knows" }, "count": { "value": "2" } }
            ],
            "typeBindings": [
                { "type": { "value": "http://example.org/Person" }, "count": { "value": 5 } }
            ]
        })));
        assert_eq!(data.relationship_items().len(), 1);

        data.apply(update(json!({ "namespaces": ["ex=http://example.org/"] })));
        let labels: Vec<_> = data.relationship_items().iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["<http://example.org/knows>", "ex:knows"]);
        assert_eq!(data.type_items()[1].label, "ex:Person");
        assert_eq!(data.type_items()[1].detail.as_deref(), Some("5 occurrences"));
    }

    #[test]
    fn bindings_arriving_after_namespaces_use_them() {
        let mut data = CompletionData::new();
        data.apply(update(json!({ "namespaceMap": { "ex": "http://example.org/" } })));
        data.apply(update(json!({
            "typeBindings": [
                { "type": { "value": "http://example.org/Person" }, "count": { "value": "1" } }
            ]
        })));
        assert_eq!(data.type_items()[1].label, "ex:Person");
        assert!(data.relationship_items().is_empty());
        assert_eq!(data.namespaces().get("ex"), Some("http://example.org/"));
    }
}
