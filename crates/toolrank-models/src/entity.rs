//! Ranked catalog entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::evidence::EvidenceBlob;

/// Lifecycle status of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    #[default]
    Active,
    Beta,
    Discontinued,
    Acquired,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Beta => "beta",
            Self::Discontinued => "discontinued",
            Self::Acquired => "acquired",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "ga" | "live" => Ok(Self::Active),
            "beta" | "alpha" | "preview" => Ok(Self::Beta),
            "discontinued" | "deprecated" | "shutdown" => Ok(Self::Discontinued),
            "acquired" => Ok(Self::Acquired),
            other => Err(format!("unknown lifecycle status: '{}'", other)),
        }
    }
}

/// A ranked catalog item (a tool) together with its raw evidence blob.
///
/// The blob is heterogeneous: one logical fact may be stored under several
/// legacy paths. Scorers never read it directly; it is normalized first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: LifecycleStatus,
    #[serde(default)]
    pub evidence: EvidenceBlob,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            status: LifecycleStatus::Active,
            evidence: EvidenceBlob::default(),
        }
    }

    pub fn with_status(mut self, status: LifecycleStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_evidence(mut self, evidence: EvidenceBlob) -> Self {
        self.evidence = evidence;
        self
    }

    /// Key used by the alphabetical tiebreak: lowercase name, then id.
    pub fn sort_key(&self) -> (String, &str) {
        (self.name.to_lowercase(), self.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_aliases() {
        assert_eq!("GA".parse::<LifecycleStatus>().unwrap(), LifecycleStatus::Active);
        assert_eq!("preview".parse::<LifecycleStatus>().unwrap(), LifecycleStatus::Beta);
        assert!("sunsetting-soon".parse::<LifecycleStatus>().is_err());
    }

    #[test]
    fn test_entity_deserialize_defaults() {
        let e: Entity = serde_json::from_str(r#"{"id":"cursor","name":"Cursor"}"#).unwrap();
        assert_eq!(e.status, LifecycleStatus::Active);
        assert!(e.category.is_empty());
        assert!(e.evidence.is_empty());
    }
}
