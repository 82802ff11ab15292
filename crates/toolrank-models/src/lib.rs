//! # toolrank models
//!
//! Plain data types shared by the store, the scoring engine and the runner.
//! No I/O and no scoring logic lives here.
//!
//! ## Modules
//! - `entity`: ranked catalog items and lifecycle status
//! - `evidence`: nested evidence blobs, time-stamped evidence records, issues
//! - `press`: press items, mentions and the decayed news impact summary
//! - `factors`: the eight scoring dimensions
//! - `weights`: per-version weight tables
//! - `snapshot`: immutable, digest-sealed ranking snapshots

pub mod entity;
pub mod evidence;
pub mod factors;
pub mod press;
pub mod snapshot;
pub mod weights;

pub use entity::{Entity, LifecycleStatus};
pub use evidence::{EvidenceBlob, EvidenceIssue, EvidenceRecord};
pub use factors::{Dimension, FactorScores};
pub use press::{
    ImportanceTier, MarketImpactTier, Mention, NewsImpact, PressItem, PressKind, Relevance,
    Sentiment,
};
pub use snapshot::{
    ExcludedEntity, RankingEntry, RankingSnapshot, SNAPSHOT_SCHEMA, SnapshotKind, SnapshotMeta,
    TiebreakBreakdown, generate_snapshot_id, link_previous,
};
pub use weights::{WEIGHT_SUM_TOLERANCE, WeightError, WeightTable};
