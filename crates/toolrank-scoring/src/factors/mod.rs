//! Factor scorers.
//!
//! Eight pure functions, one per [`Dimension`], each returning a score on
//! the internal 0–100 scale. Scorers read only [`NormalizedEvidence`], the
//! entity's decayed [`NewsImpact`] and the reference time; they never fail.
//! Absent evidence yields the dimension's neutral default, except for the
//! evidence-gated dimensions which default to zero.
//!
//! The engine rescales results to the version's score range.

pub mod adoption;
pub mod capability;
pub mod innovation;
pub mod market;
pub mod resilience;
pub mod sentiment;
pub mod technical;
pub mod velocity;

use chrono::{DateTime, Utc};

use toolrank_models::{Dimension, Entity, FactorScores, NewsImpact};

use crate::normalize::NormalizedEvidence;
use crate::versions::NewsStrategy;

/// Upper bound of the internal scale.
pub const FACTOR_MAX: f64 = 100.0;

/// Score each dimension takes when there is no evidence at all.
pub fn neutral_default(dim: Dimension) -> f64 {
    if dim.is_evidence_gated() {
        return 0.0;
    }
    match dim {
        Dimension::Capability => 50.0,
        Dimension::Innovation => 40.0,
        Dimension::TechnicalDepth => 50.0,
        Dimension::Adoption | Dimension::MarketTraction => 0.0,
        Dimension::Sentiment => 50.0,
        Dimension::Velocity => 50.0,
        Dimension::Resilience => 40.0,
    }
}

/// Everything a scorer may look at for one entity.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub entity: &'a Entity,
    pub evidence: &'a NormalizedEvidence,
    pub news: &'a NewsImpact,
    /// Press mentions counted for adoption and sentiment volume.
    pub press_count: u64,
    pub news_strategy: NewsStrategy,
    pub reference: DateTime<Utc>,
}

impl ScoringInput<'_> {
    /// Category normalized to lowercase kebab-case.
    pub fn category(&self) -> String {
        self.entity
            .category
            .trim()
            .to_lowercase()
            .replace(['_', ' '], "-")
    }
}

/// Points for the highest threshold `value` reaches.
///
/// `table` is ordered from the highest threshold down; values below the
/// last threshold score zero.
pub fn step(value: f64, table: &[(f64, f64)]) -> f64 {
    table
        .iter()
        .find(|(threshold, _)| value >= *threshold)
        .map_or(0.0, |(_, points)| *points)
}

/// Count of distinct `keywords` occurring in `text`.
pub fn keyword_hits(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| text.contains(*k)).count()
}

/// Raw scorer output for every dimension, before bounds checks.
pub fn score_all(input: &ScoringInput) -> FactorScores {
    FactorScores {
        capability: capability::score(input),
        innovation: innovation::score(input),
        technical_depth: technical::score(input),
        adoption: adoption::score(input),
        market_traction: market::score(input),
        sentiment: sentiment::score(input),
        velocity: velocity::score(input),
        resilience: resilience::score(input),
    }
}

/// Add the distributed news nudges to adoption, innovation and velocity.
///
/// No-op for strategies that route news through sentiment only.
pub fn apply_news_nudges(scores: &mut FactorScores, strategy: NewsStrategy, news: &NewsImpact) {
    let nudge = strategy.side_nudge(news.net_impact);
    if nudge == 0.0 {
        return;
    }
    for dim in [
        Dimension::Adoption,
        Dimension::Innovation,
        Dimension::Velocity,
    ] {
        let value = (scores.get(dim) + nudge).clamp(0.0, FACTOR_MAX);
        scores.set(dim, value);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::TimeZone;

    pub fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 23, 59, 59).unwrap()
    }

    pub fn input<'a>(
        entity: &'a Entity,
        evidence: &'a NormalizedEvidence,
        news: &'a NewsImpact,
    ) -> ScoringInput<'a> {
        ScoringInput {
            entity,
            evidence,
            news,
            press_count: 0,
            news_strategy: NewsStrategy::SentimentOnly,
            reference: reference(),
        }
    }
}
