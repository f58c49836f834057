//! Datasets: the values a template is filled with

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::control::ControlKey;
use crate::schema::SchemaError;

/// A named set of values keyed by field id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Schema/template this dataset was created for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub values: Map<String, Value>,
    /// RFC 3339 timestamp of the last save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from a JSON object of values
    pub fn from_values(values: Value) -> Self {
        let values = match values {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            values,
            ..Default::default()
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Resolve a dot path (`tenant.name`, `parties.0.name`).
    ///
    /// An exact top-level key wins over path traversal, so ids containing dots still resolve.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(path) {
            return Some(value);
        }

        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Resolve the value a control key addresses
    pub fn resolve_key(&self, key: &ControlKey) -> Option<&Value> {
        match (key.index, &key.sub_field) {
            (Some(index), Some(sub)) => self.resolve(&key.field_id)?.get(index)?.get(sub),
            _ => self.resolve(&key.field_id),
        }
    }

    /// Resolve a value and drop it when it reads as empty
    pub fn resolve_non_empty(&self, key: &ControlKey) -> Option<&Value> {
        self.resolve_key(key).filter(|v| !is_empty_value(v))
    }

    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Null, blank strings, and empty collections count as "no value"
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty() || map.values().all(is_empty_value),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Plain string form of a value, without JSON quoting for strings
pub fn value_to_plain_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
