//! # Versioned Ranking Engine
//!
//! Scores every entity under one [`AlgorithmVersion`] and one explicit
//! [`WeightTable`], then assigns ranks.
//!
//! ## Pipeline (per entity)
//! 1. Normalize evidence (fallback paths, malformed values flagged)
//! 2. Decayed news impact as of the reference time
//! 3. Eight factor scorers on the internal 0–100 scale; out-of-bounds values
//!    are logged, recorded as issues and clamped
//! 4. Version news strategy (distributed nudges)
//! 5. Rescale to `[0, MAX]`, weighted sum, confidence gate
//! 6. Round to the precision step and add the tiebreak nudge
//!
//! ## Determinism Contract
//! - Per-entity scoring is pure; the worker pool only changes wall time
//! - Results are collected in input order and ranked by one stable sort
//! - Same inputs + same version + same weights ⇒ same snapshot digest

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use toolrank_models::{
    Dimension, Entity, EvidenceIssue, ExcludedEntity, FactorScores, NewsImpact, PressItem,
    RankingEntry, RankingSnapshot, SnapshotKind, SnapshotMeta, WeightTable, link_previous,
};
use toolrank_store::{EvidenceStore, PressSource};

use crate::completeness::{self, ChecklistItem};
use crate::error::EngineError;
use crate::factors::{self, FACTOR_MAX, ScoringInput};
use crate::news_impact::{DEFAULT_HALF_LIFE_DAYS, NewsConfig, PressIndex};
use crate::normalize::NormalizedEvidence;
use crate::tiebreak::{self, TiebreakDigits};
use crate::versions::{AlgorithmVersion, VersionProfile};

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Scoring threads; 0 selects half the available cores.
    pub workers: usize,
    pub half_life_days: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
        }
    }
}

impl EngineConfig {
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            (num_cpus::get() / 2).max(1)
        } else {
            self.workers
        }
    }
}

/// Header of one ranking run.
#[derive(Debug, Clone)]
pub struct RankRequest<'a> {
    pub period: String,
    pub reference: DateTime<Utc>,
    pub kind: SnapshotKind,
    pub created_at: DateTime<Utc>,
    /// Prior snapshot used only to record previous rank and movement.
    pub previous: Option<&'a RankingSnapshot>,
}

impl<'a> RankRequest<'a> {
    /// Live run: evidence as it stands now.
    pub fn live(period: impl Into<String>, reference: DateTime<Utc>) -> Self {
        Self {
            period: period.into(),
            reference,
            kind: SnapshotKind::Live,
            created_at: reference,
            previous: None,
        }
    }

    /// Historical run; the creation time is pinned to the reference time.
    pub fn historical(period: impl Into<String>, reference: DateTime<Utc>) -> Self {
        Self {
            period: period.into(),
            reference,
            kind: SnapshotKind::Historical,
            created_at: reference,
            previous: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_previous(mut self, previous: Option<&'a RankingSnapshot>) -> Self {
        self.previous = previous;
        self
    }
}

/// Pre-tiebreak result for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntity {
    pub entity_id: String,
    pub entity_name: String,
    sort_key: (String, String),
    /// On the version's `[0, MAX]` scale.
    pub factor_scores: FactorScores,
    pub weighted_sum: f64,
    pub completeness: f64,
    pub confidence_multiplier: f64,
    /// `weighted_sum × confidence_multiplier`
    pub adjusted: f64,
    pub digits: TiebreakDigits,
    pub news: NewsImpact,
    pub issues: Vec<EvidenceIssue>,
}

/// One dimension's share of the weighted sum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorContribution {
    pub dimension: Dimension,
    pub score: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// Per-factor audit of one entity, without rank or tiebreak.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub entity_id: String,
    pub entity_name: String,
    pub algorithm_version: AlgorithmVersion,
    pub reference_date: DateTime<Utc>,
    pub max_score: f64,
    pub factors: Vec<FactorContribution>,
    pub weighted_sum: f64,
    pub completeness: f64,
    pub missing_evidence: Vec<ChecklistItem>,
    pub confidence_multiplier: f64,
    pub adjusted_score: f64,
    pub news: NewsImpact,
    pub issues: Vec<EvidenceIssue>,
}

pub struct Engine {
    profile: VersionProfile,
    weights: WeightTable,
    news: NewsConfig,
    pool: Arc<rayon::ThreadPool>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("profile", &self.profile)
            .field("weights", &self.weights)
            .field("news", &self.news)
            .field("workers", &self.pool.current_num_threads())
            .finish()
    }
}

impl Engine {
    /// Validates the weight table and news half-life, then starts the worker pool.
    pub fn new(
        version: AlgorithmVersion,
        weights: WeightTable,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        if !(config.half_life_days.is_finite() && config.half_life_days > 0.0) {
            return Err(EngineError::InvalidHalfLife(config.half_life_days));
        }
        weights
            .validate()
            .map_err(|source| EngineError::InvalidWeights {
                version: version.to_string(),
                source,
            })?;
        let workers = config.effective_workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| EngineError::WorkerPool(e.to_string()))?;
        debug!(version = %version, workers, "engine ready");
        Ok(Self {
            profile: version.profile(),
            weights,
            news: NewsConfig {
                half_life_days: config.half_life_days,
                ..NewsConfig::default()
            },
            pool: Arc::new(pool),
        })
    }

    pub fn version(&self) -> AlgorithmVersion {
        self.profile.version
    }

    pub fn profile(&self) -> &VersionProfile {
        &self.profile
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn news_config(&self) -> &NewsConfig {
        &self.news
    }

    /// Run `f` on the engine's worker pool.
    pub fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        self.pool.install(f)
    }

    /// Score one entity. Pure; never fails.
    pub fn score_entity(
        &self,
        entity: &Entity,
        press: &PressIndex<'_>,
        reference: DateTime<Utc>,
    ) -> ScoredEntity {
        let evidence = NormalizedEvidence::from_entity(entity);
        let news = press.impact(&entity.id, &self.news);
        let press_count = evidence
            .press_mentions
            .unwrap_or_else(|| press.adoption_press_count(&entity.id, self.profile.adoption_press));

        let input = ScoringInput {
            entity,
            evidence: &evidence,
            news: &news,
            press_count,
            news_strategy: self.profile.news,
            reference,
        };

        let mut issues = evidence.issues.clone();
        let raw = factors::score_all(&input);
        let mut internal = raw.map(|dim, value| {
            if value.is_finite() && (0.0..=FACTOR_MAX).contains(&value) {
                return value;
            }
            warn!(
                entity_id = %entity.id,
                dimension = %dim,
                value,
                "factor score out of bounds, clamping"
            );
            issues.push(EvidenceIssue::factor_out_of_bounds(dim.as_str(), value));
            if value.is_nan() {
                factors::neutral_default(dim)
            } else {
                value.clamp(0.0, FACTOR_MAX)
            }
        });
        factors::apply_news_nudges(&mut internal, self.profile.news, &news);

        let scale = self.profile.scale();
        let factor_scores = internal.map(|_, value| value * scale);
        let weighted_sum = factor_scores.weighted_sum(&self.weights);
        let completeness = completeness::completeness(&evidence);
        let confidence_multiplier = if self.profile.apply_confidence {
            completeness::confidence_multiplier(completeness)
        } else {
            1.0
        };

        for issue in &evidence.issues {
            warn!(
                entity_id = %entity.id,
                field = %issue.field,
                path = issue.path.as_deref().unwrap_or(""),
                reason = %issue.reason,
                "malformed evidence treated as absent"
            );
        }
        debug!(
            entity_id = %entity.id,
            weighted_sum,
            completeness,
            confidence_multiplier,
            "entity scored"
        );

        ScoredEntity {
            entity_id: entity.id.clone(),
            entity_name: entity.name.clone(),
            sort_key: (entity.name.to_lowercase(), entity.id.clone()),
            factor_scores,
            weighted_sum,
            completeness,
            confidence_multiplier,
            adjusted: weighted_sum * confidence_multiplier,
            digits: tiebreak::digits(&evidence),
            news,
            issues,
        }
    }

    /// Score, tiebreak, rank and seal a snapshot.
    pub fn rank(
        &self,
        entities: &[Entity],
        press: &[PressItem],
        excluded: Vec<ExcludedEntity>,
        request: &RankRequest<'_>,
    ) -> RankingSnapshot {
        info!(
            period = %request.period,
            version = %self.profile.version,
            kind = %request.kind,
            entities = entities.len(),
            press_items = press.len(),
            "ranking run started"
        );

        let index = PressIndex::build(press, request.reference);
        let scored: Vec<ScoredEntity> = self.pool.install(|| {
            entities
                .par_iter()
                .map(|e| self.score_entity(e, &index, request.reference))
                .collect()
        });

        let mut rankings = self.assign_ranks(scored);
        if let Some(previous) = request.previous {
            link_previous(&mut rankings, previous);
        }

        let flagged = rankings.iter().filter(|r| !r.issues.is_empty()).count();
        let snapshot = RankingSnapshot::seal(
            SnapshotMeta {
                period: request.period.clone(),
                algorithm_version: self.profile.version.to_string(),
                kind: request.kind,
                reference_date: request.reference,
                created_at: request.created_at,
            },
            rankings,
            excluded,
        );
        info!(
            snapshot_id = %snapshot.snapshot_id,
            ranked = snapshot.rankings.len(),
            excluded = snapshot.excluded.len(),
            flagged,
            "ranking run complete"
        );
        snapshot
    }

    /// Rank every entity in the store on its current evidence.
    pub fn rank_current(
        &self,
        store: &dyn EvidenceStore,
        press: &dyn PressSource,
        request: &RankRequest<'_>,
    ) -> Result<RankingSnapshot, EngineError> {
        let mut entities = Vec::new();
        let mut excluded = Vec::new();
        for id in store.entity_ids()? {
            match store.evidence(&id)? {
                Some(entity) => entities.push(entity),
                None => excluded.push(ExcludedEntity {
                    entity_id: id,
                    reason: "entity not found in store".to_string(),
                }),
            }
        }
        let items = press.press_items(None)?;
        Ok(self.rank(&entities, &items, excluded, request))
    }

    /// Per-factor breakdown for one entity out of a press collection.
    pub fn explain(
        &self,
        entity: &Entity,
        press: &[PressItem],
        reference: DateTime<Utc>,
    ) -> Explanation {
        let index = PressIndex::build(press, reference);
        let scored = self.score_entity(entity, &index, reference);
        let evidence = NormalizedEvidence::from_entity(entity);
        let factors = scored
            .factor_scores
            .iter()
            .map(|(dimension, score)| {
                let weight = self.weights.get(dimension);
                FactorContribution {
                    dimension,
                    score,
                    weight,
                    contribution: score * weight,
                }
            })
            .collect();
        Explanation {
            entity_id: scored.entity_id,
            entity_name: scored.entity_name,
            algorithm_version: self.profile.version,
            reference_date: reference,
            max_score: self.profile.max_score,
            factors,
            weighted_sum: scored.weighted_sum,
            completeness: scored.completeness,
            missing_evidence: completeness::missing(&evidence),
            confidence_multiplier: scored.confidence_multiplier,
            adjusted_score: scored.adjusted,
            news: scored.news,
            issues: scored.issues,
        }
    }

    fn assign_ranks(&self, scored: Vec<ScoredEntity>) -> Vec<RankingEntry> {
        let keys: Vec<&(String, String)> = scored.iter().map(|s| &s.sort_key).collect();
        let alphabetical = tiebreak::alphabetical_indices(&keys);
        let population = scored.len();

        let mut rows: Vec<RankingEntry> = scored
            .into_iter()
            .zip(alphabetical)
            .map(|(s, alpha)| {
                let (score, breakdown) =
                    tiebreak::resolve(s.adjusted, s.digits, alpha, population, &self.profile);
                RankingEntry {
                    entity_id: s.entity_id,
                    entity_name: s.entity_name,
                    rank: 0,
                    score,
                    factor_scores: s.factor_scores,
                    weighted_sum: s.weighted_sum,
                    completeness: s.completeness,
                    confidence_multiplier: s.confidence_multiplier,
                    tiebreak: breakdown,
                    news: s.news,
                    issues: s.issues,
                    previous_rank: None,
                    movement: None,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.tiebreak.alphabetical_index.cmp(&b.tiebreak.alphabetical_index))
        });
        for (i, row) in rows.iter_mut().enumerate() {
            row.rank = i as u32 + 1;
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use toolrank_models::EvidenceBlob;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 23, 59, 59).unwrap()
    }

    fn engine(version: AlgorithmVersion) -> Engine {
        let config = EngineConfig {
            workers: 2,
            ..EngineConfig::default()
        };
        Engine::new(version, version.default_weights(), config).unwrap()
    }

    #[test]
    fn test_invalid_weights_rejected_before_run() {
        let mut weights = AlgorithmVersion::V7_0.default_weights();
        weights.sentiment = 0.5;
        let err = Engine::new(AlgorithmVersion::V7_0, weights, EngineConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidWeights { .. }));
    }

    #[test]
    fn test_non_positive_half_life_rejected() {
        for half_life_days in [0.0, -30.0, f64::NAN, f64::INFINITY] {
            let config = EngineConfig {
                workers: 1,
                half_life_days,
            };
            let err = Engine::new(
                AlgorithmVersion::V7_1,
                AlgorithmVersion::V7_1.default_weights(),
                config,
            )
            .unwrap_err();
            assert!(matches!(err, EngineError::InvalidHalfLife(_)), "{}", half_life_days);
        }
    }

    #[test]
    fn test_v6_skips_confidence_gate() {
        let e = engine(AlgorithmVersion::V6_0);
        let entity = Entity::new("x", "X", "other");
        let index = PressIndex::default();
        let scored = e.score_entity(&entity, &index, reference());
        assert_eq!(scored.confidence_multiplier, 1.0);
        assert!(scored.factor_scores.iter().all(|(_, v)| v <= 10.0));
    }

    #[test]
    fn test_malformed_evidence_flags_row() {
        let e = engine(AlgorithmVersion::V7_0);
        let entity = Entity::new("x", "X", "other")
            .with_evidence(EvidenceBlob::from_value(json!({"metrics": {"users": "lots"}})));
        let snapshot = e.rank(
            &[entity],
            &[],
            Vec::new(),
            &RankRequest::live("2025-06", reference()),
        );
        assert_eq!(snapshot.rankings.len(), 1);
        assert_eq!(snapshot.rankings[0].issues.len(), 1);
        assert_eq!(snapshot.rankings[0].factor_scores.adoption, 0.0);
    }

    #[test]
    fn test_empty_run_is_valid() {
        let e = engine(AlgorithmVersion::V7_1);
        let snapshot = e.rank(&[], &[], Vec::new(), &RankRequest::live("2025-06", reference()));
        assert!(snapshot.rankings.is_empty());
        assert!(snapshot.verify_digest());
    }

    #[test]
    fn test_explain_contributions_sum() {
        let e = engine(AlgorithmVersion::V7_0);
        let entity = Entity::new("x", "X", "code-editor");
        let explanation = e.explain(&entity, &[], reference());
        let total: f64 = explanation.factors.iter().map(|f| f.contribution).sum();
        assert!((total - explanation.weighted_sum).abs() < 1e-9);
        assert_eq!(explanation.missing_evidence.len(), ChecklistItem::ALL.len());
    }
}
