//! # toolrank store
//!
//! Read-only access to the evidence the engine consumes. Ingestion (an
//! external collaborator) appends records; this crate only reads them.
//!
//! ## Interfaces
//! - [`EvidenceStore`]: current and as-of evidence per entity
//! - [`PressSource`]: the press collection
//! - [`WeightSource`]: weight tables by algorithm version
//!
//! ## Backends
//! - [`MemoryStore`]: in-process, used by tests and as the cache behind
//!   [`DirectoryStore`]
//! - [`DirectoryStore`]: JSONL/TOML files in one data directory

pub mod directory;
pub mod jsonl;
pub mod memory;

pub use directory::DirectoryStore;
pub use jsonl::{JsonlReader, read_all, read_optional};
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use toolrank_models::{Entity, PressItem, WeightTable};

/// Store error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("TOML error in {path}: {message}")]
    Toml { path: PathBuf, message: String },

    #[error("duplicate entity id: {0}")]
    DuplicateEntity(String),
}

/// Evidence per entity.
pub trait EvidenceStore: Send + Sync {
    /// All known entity ids, sorted.
    fn entity_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Entity with its current evidence blob.
    fn evidence(&self, entity_id: &str) -> Result<Option<Entity>, StoreError>;

    /// Entity with a blob built only from records dated at or before `as_of`.
    ///
    /// `None` when the entity is unknown or had no dated evidence yet.
    fn evidence_as_of(
        &self,
        entity_id: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Option<Entity>, StoreError>;
}

/// Press collection.
pub trait PressSource: Send + Sync {
    /// Items published at or after `since` (all items when `None`), ordered
    /// by publication time then id.
    fn press_items(&self, since: Option<DateTime<Utc>>) -> Result<Vec<PressItem>, StoreError>;
}

/// Weight tables by algorithm version string (`"v7.0"`).
pub trait WeightSource: Send + Sync {
    fn weights(&self, version: &str) -> Result<Option<WeightTable>, StoreError>;
}
