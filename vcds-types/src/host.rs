//! Monitored host records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A monitored machine as reported by `GET /api/v2/hosts`.
///
/// Everything besides `id` and `name` lands in `attributes`, so filters can
/// address any field the API returns (`env`, `type`, `os`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    pub id: u64,

    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl HostRecord {
    /// Create a host with no extra attributes.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up a field by key as text.
    ///
    /// `name` and `id` resolve to the record's own fields. String attributes
    /// yield their content; other JSON values yield their JSON text.
    pub fn field(&self, key: &str) -> Option<String> {
        match key {
            "name" => Some(self.name.clone()),
            "id" => Some(self.id.to_string()),
            _ => self.attributes.get(key).map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }
}
