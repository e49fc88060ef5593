//! Per-language configuration of the shared engine.
//!
//! A [`LanguageDefinition`] knows how to build a
//! [`LanguageProfile`] once the client's initialization options are known,
//! and how the binary and server identify themselves. Nothing else differs
//! between the servers.

use serde::Deserialize;
use serde_json::Value;
use stardog_analysis::profile::LanguageProfile;

pub mod graphql;
pub mod shacl;
pub mod sparql;
pub mod turtle;

pub use graphql::GraphQlLanguage;
pub use shacl::ShaclLanguage;
pub use sparql::SparqlLanguage;
pub use turtle::{TrigLanguage, TurtleLanguage};

/// `initializationOptions` understood by every server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializationOptions {
    /// Grammar flavor: `"w3"` for SPARQL, `"standard"` for GraphQL.
    #[serde(default)]
    pub grammar: Option<String>,
}

impl InitializationOptions {
    /// Unknown or malformed options fall back to the defaults.
    pub fn from_value(value: Option<Value>) -> Self {
        let Some(value) = value.filter(|value| !value.is_null()) else {
            return Self::default();
        };
        match serde_json::from_value(value) {
            Ok(options) => options,
            Err(err) => {
                tracing::warn!(%err, "ignoring malformed initialization options");
                Self::default()
            }
        }
    }

    pub fn grammar(&self) -> Option<&str> {
        self.grammar.as_deref()
    }
}

pub trait LanguageDefinition: Send + Sync + 'static {
    /// Human-readable language name, used in CLI help.
    fn display_name(&self) -> &'static str;

    /// Name reported in `InitializeResult.server_info`.
    fn server_name(&self) -> &'static str;

    fn profile(&self, options: &InitializationOptions) -> LanguageProfile;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_default_when_absent_or_malformed() {
        assert_eq!(InitializationOptions::from_value(None), InitializationOptions::default());
        assert_eq!(
            InitializationOptions::from_value(Some(Value::Null)),
            InitializationOptions::default()
        );
        assert_eq!(
            InitializationOptions::from_value(Some(json!({ "grammar": 3 }))).grammar(),
            None
        );
    }

    #[test]
    fn options_read_grammar() {
        let options = InitializationOptions::from_value(Some(json!({ "grammar": "w3", "other": 1 })));
        assert_eq!(options.grammar(), Some("w3"));
    }
}
