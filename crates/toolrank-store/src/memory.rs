//! In-memory evidence store.
//!
//! Holds the base entity records, the append-only evidence history and the
//! press collection. Reads never mutate anything, so one store can serve a
//! live run and any number of historical reconstructions at once.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

use toolrank_models::{
    Entity, EvidenceBlob, EvidenceRecord, LifecycleStatus, PressItem, WeightTable,
};

use crate::{EvidenceStore, PressSource, StoreError, WeightSource};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entities: BTreeMap<String, Entity>,
    /// Per-entity records in ingestion order.
    history: BTreeMap<String, Vec<EvidenceRecord>>,
    press: Vec<PressItem>,
    weights: BTreeMap<String, WeightTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_entity(&mut self, entity: Entity) -> Result<(), StoreError> {
        if self.entities.contains_key(&entity.id) {
            return Err(StoreError::DuplicateEntity(entity.id));
        }
        self.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    pub fn append_record(&mut self, record: EvidenceRecord) {
        self.history
            .entry(record.entity_id.clone())
            .or_default()
            .push(record);
    }

    pub fn add_press_item(&mut self, item: PressItem) {
        self.press.push(item);
    }

    pub fn set_weights(&mut self, version: impl Into<String>, weights: WeightTable) {
        self.weights.insert(version.into(), weights);
    }

    pub fn with_entity(mut self, entity: Entity) -> Result<Self, StoreError> {
        self.insert_entity(entity)?;
        Ok(self)
    }

    pub fn with_record(mut self, record: EvidenceRecord) -> Self {
        self.append_record(record);
        self
    }

    pub fn with_press_item(mut self, item: PressItem) -> Self {
        self.add_press_item(item);
        self
    }

    pub fn with_weights(mut self, version: impl Into<String>, weights: WeightTable) -> Self {
        self.set_weights(version, weights);
        self
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.entities.contains_key(entity_id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Records for an entity, stably ordered by `recorded_at` (undated first).
    fn ordered_history(&self, entity_id: &str) -> Vec<&EvidenceRecord> {
        let mut records: Vec<&EvidenceRecord> = self
            .history
            .get(entity_id)
            .map(|v| v.iter().collect())
            .unwrap_or_default();
        records.sort_by_key(|r| r.recorded_at);
        records
    }
}

impl EvidenceStore for MemoryStore {
    fn entity_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entities.keys().cloned().collect())
    }

    fn evidence(&self, entity_id: &str) -> Result<Option<Entity>, StoreError> {
        let Some(base) = self.entities.get(entity_id) else {
            return Ok(None);
        };
        let mut entity = base.clone();
        for record in self.ordered_history(entity_id) {
            entity.evidence.insert(&record.path, record.value.clone());
        }
        Ok(Some(entity))
    }

    fn evidence_as_of(
        &self,
        entity_id: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Option<Entity>, StoreError> {
        let Some(base) = self.entities.get(entity_id) else {
            return Ok(None);
        };
        let admissible: Vec<&EvidenceRecord> = self
            .ordered_history(entity_id)
            .into_iter()
            .filter(|r| r.recorded_at.is_some_and(|at| at <= as_of))
            .collect();
        if admissible.is_empty() {
            debug!(entity_id, %as_of, "no dated evidence at or before reference time");
            return Ok(None);
        }
        let mut blob = EvidenceBlob::new();
        for record in admissible {
            blob.insert(&record.path, record.value.clone());
        }
        // Status on the base record is today's; only dated status records count.
        Ok(Some(
            base.clone()
                .with_status(LifecycleStatus::default())
                .with_evidence(blob),
        ))
    }
}

impl PressSource for MemoryStore {
    fn press_items(&self, since: Option<DateTime<Utc>>) -> Result<Vec<PressItem>, StoreError> {
        let mut items: Vec<PressItem> = self
            .press
            .iter()
            .filter(|p| since.is_none_or(|s| p.published_at >= s))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.published_at
                .cmp(&b.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(items)
    }
}

impl WeightSource for MemoryStore {
    fn weights(&self, version: &str) -> Result<Option<WeightTable>, StoreError> {
        Ok(self.weights.get(version).copied())
    }
}
