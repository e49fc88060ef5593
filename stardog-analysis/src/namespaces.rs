//! Namespace aliases and IRI abbreviation.

use std::collections::BTreeMap;

/// Alias → IRI prefix. Later inserts replace earlier ones for the same alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap {
    entries: BTreeMap<String, String>,
}

impl NamespaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `alias=iri` rows.
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::new();
        for row in rows {
            let (alias, iri) = split_namespace(row.as_ref());
            map.insert(alias, iri);
        }
        map
    }

    pub fn insert(&mut self, alias: impl Into<String>, iri: impl Into<String>) {
        self.entries.insert(alias.into(), iri.into());
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(alias, iri)| (alias.as_str(), iri.as_str()))
    }

    pub fn to_rows(&self) -> Vec<String> {
        self.iter().map(|(alias, iri)| format!("{alias}={iri}")).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shortest `alias:local` form of `iri`, if any namespace prefixes it.
    pub fn abbreviate(&self, iri: &str) -> Option<String> {
        let mut best: Option<(&str, &str)> = None;
        for (alias, prefix) in self.iter() {
            let Some(local) = local_name(iri, prefix) else {
                continue;
            };
            if best.map_or(true, |(_, current)| local.len() < current.len()) {
                best = Some((alias, local));
            }
        }
        best.map(|(alias, local)| format!("{alias}:{local}"))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NamespaceMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (alias, iri) in iter {
            map.insert(alias, iri);
        }
        map
    }
}

/// Split an `alias=iri` row on its first `=`.
pub fn split_namespace(row: &str) -> (&str, &str) {
    row.split_once('=').unwrap_or((row, ""))
}

/// Local part of `iri` (optionally wrapped in `<>`) after `prefix`. The local
/// part must be non-empty and contain no whitespace.
fn local_name<'a>(iri: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    let inner = iri.strip_prefix('<').unwrap_or(iri);
    let rest = inner.strip_prefix(prefix)?;
    let local = match rest.strip_suffix('>') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => rest,
    };
    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return None;
    }
    Some(local)
}
