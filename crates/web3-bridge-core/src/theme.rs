//! Theme descriptors (CSS custom property -> value)

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Mapping from CSS-variable-style keys to values.
///
/// Stateless: applied immediately and never retained by the bridge.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ThemeDescriptor {
    vars: BTreeMap<String, String>,
}

impl ThemeDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in palette applied when init supplies no theme
    pub fn default_palette() -> Self {
        [
            ("--w3o-background-color", "#1a1d26"),
            ("--w3o-foreground-color", "#242835"),
            ("--w3o-text-color", "#eff1fc"),
            ("--w3o-border-color", "#33394b"),
            ("--w3o-action-color", "#929bed"),
            ("--w3o-border-radius", "16px"),
        ]
        .into_iter()
        .collect()
    }

    /// Parse a theme from its JSON object form
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ThemeDescriptor {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// Non-string values are coerced the way the page would stringify them
impl<'de> Deserialize<'de> for ThemeDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: BTreeMap<String, serde_json::Value> = BTreeMap::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect())
    }
}
