//! Evidence blobs and the time-stamped records that build them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Nested, heterogeneous evidence for one entity.
///
/// Paths are dotted (`info.metrics.users`). Array indices are not addressable;
/// every fact the engine reads lives under object keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceBlob(Value);

impl Default for EvidenceBlob {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl EvidenceBlob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an arbitrary JSON value. Non-object roots are kept as-is and
    /// simply resolve no paths.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// True when the blob holds no facts at all.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Resolve a dotted path. `null` leaves count as absent.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for key in path.split('.') {
            cur = cur.as_object()?.get(key)?;
        }
        if cur.is_null() { None } else { Some(cur) }
    }

    /// Set a dotted path, creating (or replacing non-object) intermediates.
    pub fn insert(&mut self, path: &str, value: Value) {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }
        let mut cur = &mut self.0;
        let mut keys = path.split('.').peekable();
        while let Some(key) = keys.next() {
            let Value::Object(map) = cur else {
                return;
            };
            if keys.peek().is_none() {
                map.insert(key.to_string(), value);
                return;
            }
            let next = map
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !next.is_object() {
                *next = Value::Object(Map::new());
            }
            cur = next;
        }
    }
}

impl From<Value> for EvidenceBlob {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

/// One historical value of one evidence field.
///
/// Ingestion appends these over time; the sequence for a given
/// `(entity_id, path)` is the field's time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub entity_id: String,
    pub path: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl EvidenceRecord {
    pub fn new(entity_id: impl Into<String>, path: impl Into<String>, value: Value) -> Self {
        Self {
            entity_id: entity_id.into(),
            path: path.into(),
            value,
            recorded_at: None,
        }
    }

    pub fn at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = Some(recorded_at);
        self
    }
}

/// A recoverable problem found while scoring one entity.
///
/// Issues never abort a run; they travel with the entity's ranking row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceIssue {
    /// Logical field (`users`, `launch_date`) or `factor.<dimension>`.
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub reason: String,
}

impl EvidenceIssue {
    pub fn malformed(field: &str, path: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            path: Some(path.to_string()),
            reason: reason.into(),
        }
    }

    pub fn factor_out_of_bounds(dimension: &str, value: f64) -> Self {
        Self {
            field: format!("factor.{}", dimension),
            path: None,
            reason: format!("raw score {} outside [0, 100], clamped", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested_and_null() {
        let blob = EvidenceBlob::from_value(json!({
            "info": {"metrics": {"users": 1200, "stars": null}}
        }));
        assert_eq!(blob.lookup("info.metrics.users"), Some(&json!(1200)));
        assert_eq!(blob.lookup("info.metrics.stars"), None);
        assert_eq!(blob.lookup("info.missing.users"), None);
    }

    #[test]
    fn test_insert_creates_and_replaces_intermediates() {
        let mut blob = EvidenceBlob::from_value(json!({"info": "legacy string"}));
        blob.insert("info.metrics.users", json!(5));
        blob.insert("status", json!("beta"));
        assert_eq!(blob.lookup("info.metrics.users"), Some(&json!(5)));
        assert_eq!(blob.lookup("status"), Some(&json!("beta")));
    }

    #[test]
    fn test_empty_blob() {
        assert!(EvidenceBlob::default().is_empty());
        assert!(EvidenceBlob::from_value(Value::Null).is_empty());
        assert!(!EvidenceBlob::from_value(json!({"a": 1})).is_empty());
    }
}
