//! Directory-backed store.
//!
//! ## Layout
//! - `entities.jsonl`: one [`Entity`] per line (required)
//! - `evidence.jsonl`: one [`EvidenceRecord`] per line (optional)
//! - `press.jsonl`: one [`PressItem`] per line (optional)
//! - `weights.toml`: `[versions."v7.0"]` weight tables (optional)
//!
//! Everything is read once at open time; afterwards the store is served
//! from memory and never touches the disk again.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use toolrank_models::{Entity, EvidenceRecord, PressItem, WeightTable};

use crate::jsonl::{read_all, read_optional};
use crate::memory::MemoryStore;
use crate::{EvidenceStore, PressSource, StoreError, WeightSource};

pub const ENTITIES_FILE: &str = "entities.jsonl";
pub const EVIDENCE_FILE: &str = "evidence.jsonl";
pub const PRESS_FILE: &str = "press.jsonl";
pub const WEIGHTS_FILE: &str = "weights.toml";

#[derive(Debug, Deserialize)]
struct WeightsFile {
    #[serde(default)]
    versions: BTreeMap<String, WeightTable>,
}

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    inner: MemoryStore,
}

impl DirectoryStore {
    /// Load a data directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        let mut inner = MemoryStore::new();

        let entities: Vec<Entity> = read_all(root.join(ENTITIES_FILE))?;
        let entity_count = entities.len();
        for entity in entities {
            inner.insert_entity(entity)?;
        }

        let records: Vec<EvidenceRecord> = read_optional(root.join(EVIDENCE_FILE))?;
        let record_count = records.len();
        for record in records {
            if !inner.contains(&record.entity_id) {
                warn!(
                    entity_id = %record.entity_id,
                    path = %record.path,
                    "evidence record for unknown entity"
                );
            }
            inner.append_record(record);
        }

        let press: Vec<PressItem> = read_optional(root.join(PRESS_FILE))?;
        let press_count = press.len();
        for item in press {
            inner.add_press_item(item);
        }

        let weights_path = root.join(WEIGHTS_FILE);
        if weights_path.exists() {
            let raw = std::fs::read_to_string(&weights_path).map_err(|source| StoreError::Io {
                path: weights_path.clone(),
                source,
            })?;
            let file: WeightsFile = toml::from_str(&raw).map_err(|e| StoreError::Toml {
                path: weights_path.clone(),
                message: e.to_string(),
            })?;
            for (version, table) in file.versions {
                inner.set_weights(version, table);
            }
        }

        info!(
            root = %root.display(),
            entities = entity_count,
            evidence_records = record_count,
            press_items = press_count,
            "data directory loaded"
        );

        Ok(Self { inner })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl EvidenceStore for DirectoryStore {
    fn entity_ids(&self) -> Result<Vec<String>, StoreError> {
        self.inner.entity_ids()
    }

    fn evidence(&self, entity_id: &str) -> Result<Option<Entity>, StoreError> {
        self.inner.evidence(entity_id)
    }

    fn evidence_as_of(
        &self,
        entity_id: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Option<Entity>, StoreError> {
        self.inner.evidence_as_of(entity_id, as_of)
    }
}

impl PressSource for DirectoryStore {
    fn press_items(&self, since: Option<DateTime<Utc>>) -> Result<Vec<PressItem>, StoreError> {
        self.inner.press_items(since)
    }
}

impl WeightSource for DirectoryStore {
    fn weights(&self, version: &str) -> Result<Option<WeightTable>, StoreError> {
        self.inner.weights(version)
    }
}
