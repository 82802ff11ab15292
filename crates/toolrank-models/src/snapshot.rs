//! Immutable, versioned ranking snapshots.
//!
//! ## Invariants (frozen v1)
//! - Built once by [`RankingSnapshot::seal`]; never mutated afterwards
//! - Rows ordered by rank (1-based, contiguous)
//! - Digest = SHA-256 of canonical JSON of the content fields; `created_at`,
//!   `snapshot_id` and `digest` itself are excluded so identical inputs
//!   always produce identical digests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use crate::evidence::EvidenceIssue;
use crate::factors::FactorScores;
use crate::press::NewsImpact;

/// Schema version for ranking snapshots.
pub const SNAPSHOT_SCHEMA: &str = "ranking_snapshot_v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// Scored over current evidence.
    Live,
    /// Reconstructed from evidence available as of `reference_date`.
    Historical,
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => f.write_str("live"),
            Self::Historical => f.write_str("historical"),
        }
    }
}

/// Breakdown of the sub-threshold ordering nudge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TiebreakBreakdown {
    pub feature_digit: u8,
    pub description_digit: u8,
    pub pricing_digit: u8,
    /// 0-based position of the entity in (lowercase name, id) order.
    pub alphabetical_index: u32,
    /// Total nudge added to the rounded base score.
    pub nudge: f64,
}

/// One ranked entity with its full audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub entity_id: String,
    pub entity_name: String,
    pub rank: u32,
    pub score: f64,
    pub factor_scores: FactorScores,
    /// Pre-adjustment `Σ factor_i × weight_i`.
    pub weighted_sum: f64,
    /// Percentage in `[0, 100]`.
    pub completeness: f64,
    pub confidence_multiplier: f64,
    pub tiebreak: TiebreakBreakdown,
    pub news: NewsImpact,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<EvidenceIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_rank: Option<u32>,
    /// `previous_rank - rank`; positive means the entity moved up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement: Option<i64>,
}

/// An entity left out of a snapshot, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedEntity {
    pub entity_id: String,
    pub reason: String,
}

/// Header fields supplied by the engine when sealing a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotMeta {
    pub period: String,
    pub algorithm_version: String,
    pub kind: SnapshotKind,
    pub reference_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One complete ranking computation for a period + algorithm version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingSnapshot {
    pub schema_version: String,
    pub snapshot_id: String,
    pub period: String,
    pub algorithm_version: String,
    pub kind: SnapshotKind,
    pub reference_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub rankings: Vec<RankingEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<ExcludedEntity>,
    pub digest: String,
}

/// Content fields covered by the digest.
#[derive(Serialize)]
struct DigestView<'a> {
    schema_version: &'a str,
    period: &'a str,
    algorithm_version: &'a str,
    kind: SnapshotKind,
    reference_date: &'a DateTime<Utc>,
    rankings: &'a [RankingEntry],
    excluded: &'a [ExcludedEntity],
}

impl RankingSnapshot {
    /// Seal a snapshot from already-ranked rows.
    pub fn seal(
        meta: SnapshotMeta,
        rankings: Vec<RankingEntry>,
        excluded: Vec<ExcludedEntity>,
    ) -> Self {
        let mut snapshot = Self {
            schema_version: SNAPSHOT_SCHEMA.to_string(),
            snapshot_id: String::new(),
            period: meta.period,
            algorithm_version: meta.algorithm_version,
            kind: meta.kind,
            reference_date: meta.reference_date,
            created_at: meta.created_at,
            rankings,
            excluded,
            digest: String::new(),
        };
        snapshot.digest = snapshot.compute_digest();
        snapshot.snapshot_id = generate_snapshot_id(
            &snapshot.period,
            &snapshot.algorithm_version,
            snapshot.kind,
            &snapshot.digest,
        );
        snapshot
    }

    /// Recompute the content digest.
    pub fn compute_digest(&self) -> String {
        let view = DigestView {
            schema_version: &self.schema_version,
            period: &self.period,
            algorithm_version: &self.algorithm_version,
            kind: self.kind,
            reference_date: &self.reference_date,
            rankings: &self.rankings,
            excluded: &self.excluded,
        };
        // Typed structs only: serialization cannot fail.
        let canonical = serde_json::to_vec(&view).unwrap_or_default();
        hex::encode(Sha256::digest(&canonical))
    }

    pub fn verify_digest(&self) -> bool {
        self.digest == self.compute_digest()
    }

    pub fn entry(&self, entity_id: &str) -> Option<&RankingEntry> {
        self.rankings.iter().find(|r| r.entity_id == entity_id)
    }

    pub fn rank_of(&self, entity_id: &str) -> Option<u32> {
        self.entry(entity_id).map(|r| r.rank)
    }

    /// Ranks keyed by entity id.
    pub fn rank_index(&self) -> BTreeMap<&str, u32> {
        self.rankings
            .iter()
            .map(|r| (r.entity_id.as_str(), r.rank))
            .collect()
    }
}

/// Fill `previous_rank`/`movement` on rows from a prior snapshot.
pub fn link_previous(rankings: &mut [RankingEntry], prior: &RankingSnapshot) {
    let index = prior.rank_index();
    for row in rankings.iter_mut() {
        row.previous_rank = index.get(row.entity_id.as_str()).copied();
        row.movement = row
            .previous_rank
            .map(|prev| i64::from(prev) - i64::from(row.rank));
    }
}

/// Deterministic snapshot id from header and content digest.
pub fn generate_snapshot_id(
    period: &str,
    algorithm_version: &str,
    kind: SnapshotKind,
    digest: &str,
) -> String {
    let input = format!(
        "{}:{}:{}:{}:{}",
        SNAPSHOT_SCHEMA, period, algorithm_version, kind, digest
    );
    hex::encode(Sha256::digest(input.as_bytes()))
}
