//! Credential bundle handed over by the host runtime.
//!
//! The host stores credentials as a flat string map. Every field is optional
//! and an empty value means "not configured", which is how the host
//! represents a cleared form field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const AZURE_DOCINTEL_ENDPOINT: &str = "azure_document_intelligence_endpoint";
pub const AZURE_DOCINTEL_CREDENTIAL: &str = "azure_document_intelligence_credential";
pub const AZURE_DOCINTEL_API_VERSION: &str = "azure_document_intelligence_api_version";
pub const AZURE_API_KEY: &str = "azure_api_key";
pub const OPENAI_API_KEY: &str = "openai_api_key";
pub const OPENAI_BASE_URL: &str = "openai_base_url";
pub const OPENAI_MODEL: &str = "openai_model";

/// Every key the provider understands, in manifest order.
pub const KNOWN_KEYS: [&str; 7] = [
    AZURE_DOCINTEL_ENDPOINT,
    AZURE_DOCINTEL_CREDENTIAL,
    AZURE_DOCINTEL_API_VERSION,
    AZURE_API_KEY,
    OPENAI_API_KEY,
    OPENAI_BASE_URL,
    OPENAI_MODEL,
];

/// A mapping of credential names to secret values.
///
/// `Debug` never prints values.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value for `key`, trimmed, or `None` if missing or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Names of the keys that carry a non-blank value.
    pub fn configured_keys(&self) -> Vec<&str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|k| self.contains(k))
            .collect()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for key in self.0.keys() {
            let shown = if self.contains(key) { "<redacted>" } else { "<empty>" };
            map.entry(key, &shown);
        }
        map.finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Credentials
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_absent() {
        let creds = Credentials::new()
            .with(OPENAI_API_KEY, "   ")
            .with(OPENAI_MODEL, "")
            .with(OPENAI_BASE_URL, " https://api.example.com/v1 ");
        assert_eq!(creds.get(OPENAI_API_KEY), None);
        assert_eq!(creds.get(OPENAI_MODEL), None);
        assert_eq!(creds.get(OPENAI_BASE_URL), Some("https://api.example.com/v1"));
        assert_eq!(creds.configured_keys(), vec![OPENAI_BASE_URL]);
    }

    #[test]
    fn debug_redacts_values() {
        let creds = Credentials::new().with(OPENAI_API_KEY, "sk-secret");
        let shown = format!("{creds:?}");
        assert!(!shown.contains("sk-secret"), "got: {shown}");
        assert!(shown.contains("openai_api_key"));
    }

    #[test]
    fn deserializes_from_host_json() {
        let creds: Credentials = serde_json::from_str(
            r#"{"azure_document_intelligence_endpoint": "https://x.cognitiveservices.azure.com/", "openai_model": ""}"#,
        )
        .unwrap();
        assert!(creds.contains(AZURE_DOCINTEL_ENDPOINT));
        assert!(!creds.contains(OPENAI_MODEL));
    }
}
