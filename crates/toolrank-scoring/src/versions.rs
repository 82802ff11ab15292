//! Algorithm versions.
//!
//! A version is data: a [`VersionProfile`] holding the scale, rounding step,
//! whether the confidence gate applies, and which news and adoption-press
//! strategies are used. The canonical weight tables are served by
//! [`BuiltinWeights`]; a data directory may override them.
//!
//! | Version | MAX | step | confidence | news | adoption press |
//! |---------|-----|------|------------|------|----------------|
//! | v6.0 | 10 | 0.001 | off | sentiment only | all mentions |
//! | v7.0 | 100 | 0.01 | on | sentiment only | primary + secondary |
//! | v7.1 | 100 | 0.01 | on | distributed | primary + secondary |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use toolrank_models::{Relevance, WeightTable};
use toolrank_store::{StoreError, WeightSource};

use crate::error::EngineError;

/// Tagged algorithm versions; every variant stays invokable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlgorithmVersion {
    #[serde(rename = "v6.0")]
    V6_0,
    #[serde(rename = "v7.0")]
    V7_0,
    #[serde(rename = "v7.1")]
    V7_1,
}

impl AlgorithmVersion {
    pub const ALL: [AlgorithmVersion; 3] = [Self::V6_0, Self::V7_0, Self::V7_1];
    pub const LATEST: AlgorithmVersion = Self::V7_1;

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V6_0 => "v6.0",
            Self::V7_0 => "v7.0",
            Self::V7_1 => "v7.1",
        }
    }

    pub fn profile(&self) -> VersionProfile {
        match self {
            Self::V6_0 => VersionProfile {
                version: *self,
                max_score: 10.0,
                precision: 0.001,
                apply_confidence: false,
                news: NewsStrategy::SentimentOnly,
                adoption_press: AdoptionPressPolicy::AllMentions,
            },
            Self::V7_0 => VersionProfile {
                version: *self,
                max_score: 100.0,
                precision: 0.01,
                apply_confidence: true,
                news: NewsStrategy::SentimentOnly,
                adoption_press: AdoptionPressPolicy::PrimaryAndSecondary,
            },
            Self::V7_1 => VersionProfile {
                version: *self,
                max_score: 100.0,
                precision: 0.01,
                apply_confidence: true,
                news: NewsStrategy::Distributed,
                adoption_press: AdoptionPressPolicy::PrimaryAndSecondary,
            },
        }
    }

    /// Canonical weights for this version.
    pub fn default_weights(&self) -> WeightTable {
        match self {
            Self::V6_0 => WeightTable {
                capability: 0.30,
                innovation: 0.15,
                technical_depth: 0.125,
                adoption: 0.125,
                market_traction: 0.125,
                sentiment: 0.075,
                velocity: 0.05,
                resilience: 0.05,
            },
            Self::V7_0 | Self::V7_1 => WeightTable {
                capability: 0.25,
                innovation: 0.10,
                technical_depth: 0.15,
                adoption: 0.15,
                market_traction: 0.15,
                sentiment: 0.10,
                velocity: 0.05,
                resilience: 0.05,
            },
        }
    }
}

impl fmt::Display for AlgorithmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmVersion {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let key = key.strip_prefix('v').unwrap_or(&key);
        match key {
            "6" | "6.0" => Ok(Self::V6_0),
            "7" | "7.0" => Ok(Self::V7_0),
            "7.1" => Ok(Self::V7_1),
            "latest" => Ok(Self::LATEST),
            _ => Err(EngineError::UnknownVersion(s.to_string())),
        }
    }
}

/// How the decayed net news impact reaches the factor scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsStrategy {
    /// The whole adjustment feeds sentiment.
    SentimentOnly,
    /// Sentiment takes 70%; adoption, innovation and velocity take a small,
    /// bounded nudge each.
    Distributed,
}

/// Per-dimension cap on a distributed news nudge (0–100 scale).
pub const DISTRIBUTED_NUDGE_CAP: f64 = 5.0;
/// Scale applied to net impact before it becomes points.
pub const NEWS_POINTS_PER_IMPACT: f64 = 0.25;

impl NewsStrategy {
    /// Share of the news adjustment given to sentiment.
    pub fn sentiment_share(&self) -> f64 {
        match self {
            Self::SentimentOnly => 1.0,
            Self::Distributed => 0.7,
        }
    }

    /// Share given to each of adoption, innovation and velocity.
    pub fn side_share(&self) -> f64 {
        match self {
            Self::SentimentOnly => 0.0,
            Self::Distributed => 0.1,
        }
    }

    /// Points added to one non-sentiment dimension for a given net impact.
    pub fn side_nudge(&self, net_impact: f64) -> f64 {
        (net_impact * NEWS_POINTS_PER_IMPACT * self.side_share())
            .clamp(-DISTRIBUTED_NUDGE_CAP, DISTRIBUTED_NUDGE_CAP)
    }
}

/// Which press mentions count toward adoption press buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionPressPolicy {
    AllMentions,
    PrimaryAndSecondary,
}

impl AdoptionPressPolicy {
    pub fn counts(&self, relevance: Relevance) -> bool {
        match self {
            Self::AllMentions => true,
            Self::PrimaryAndSecondary => {
                matches!(relevance, Relevance::Primary | Relevance::Secondary)
            }
        }
    }
}

/// Everything that differs between versions except the weight table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VersionProfile {
    pub version: AlgorithmVersion,
    /// Upper bound of the published score scale.
    pub max_score: f64,
    /// Rounding step `U`; the smallest real score difference.
    pub precision: f64,
    pub apply_confidence: bool,
    pub news: NewsStrategy,
    pub adoption_press: AdoptionPressPolicy,
}

impl VersionProfile {
    /// Factor to move an internal 0–100 score onto this version's scale.
    pub fn scale(&self) -> f64 {
        self.max_score / 100.0
    }

    /// Number of whole precision steps below `max_score`.
    pub fn max_steps(&self) -> i64 {
        (self.max_score / self.precision).round() as i64
    }
}

/// The canonical weight tables for every version.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinWeights;

impl WeightSource for BuiltinWeights {
    fn weights(&self, version: &str) -> Result<Option<WeightTable>, StoreError> {
        Ok(version
            .parse::<AlgorithmVersion>()
            .ok()
            .filter(|v| v.as_str() == version)
            .map(|v| v.default_weights()))
    }
}

/// First table found across `sources`, validated.
///
/// Sources are consulted in order, so an override store goes before
/// [`BuiltinWeights`].
pub fn resolve_weights(
    sources: &[&dyn WeightSource],
    version: AlgorithmVersion,
) -> Result<WeightTable, EngineError> {
    for source in sources {
        if let Some(table) = source.weights(version.as_str())? {
            table
                .validate()
                .map_err(|source| EngineError::InvalidWeights {
                    version: version.to_string(),
                    source,
                })?;
            return Ok(table);
        }
    }
    Err(EngineError::MissingWeightVersion(version.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolrank_models::WEIGHT_SUM_TOLERANCE;
    use toolrank_store::MemoryStore;

    #[test]
    fn test_every_version_weights_sum_to_one() {
        for v in AlgorithmVersion::ALL {
            let w = v.default_weights();
            assert!((w.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE, "{} sums to {}", v, w.sum());
            assert!(w.validate().is_ok());
        }
    }

    #[test]
    fn test_version_parse() {
        assert_eq!("v7.0".parse::<AlgorithmVersion>().unwrap(), AlgorithmVersion::V7_0);
        assert_eq!("7.1".parse::<AlgorithmVersion>().unwrap(), AlgorithmVersion::V7_1);
        assert_eq!("V6".parse::<AlgorithmVersion>().unwrap(), AlgorithmVersion::V6_0);
        assert_eq!("latest".parse::<AlgorithmVersion>().unwrap(), AlgorithmVersion::LATEST);
        assert!(matches!(
            "v8.0".parse::<AlgorithmVersion>(),
            Err(EngineError::UnknownVersion(_))
        ));
    }

    #[test]
    fn test_max_steps() {
        assert_eq!(AlgorithmVersion::V6_0.profile().max_steps(), 10_000);
        assert_eq!(AlgorithmVersion::V7_0.profile().max_steps(), 10_000);
    }

    #[test]
    fn test_distributed_nudge_is_bounded() {
        let s = NewsStrategy::Distributed;
        assert_eq!(s.side_nudge(1_000.0), DISTRIBUTED_NUDGE_CAP);
        assert_eq!(s.side_nudge(-1_000.0), -DISTRIBUTED_NUDGE_CAP);
        assert!((s.side_nudge(40.0) - 1.0).abs() < 1e-12);
        assert_eq!(NewsStrategy::SentimentOnly.side_nudge(1_000.0), 0.0);
    }

    #[test]
    fn test_resolve_prefers_first_source() {
        let mut custom = AlgorithmVersion::V7_0.default_weights();
        custom.capability = 0.30;
        custom.innovation = 0.05;
        let store = MemoryStore::new().with_weights("v7.0", custom);
        let resolved =
            resolve_weights(&[&store, &BuiltinWeights], AlgorithmVersion::V7_0).unwrap();
        assert_eq!(resolved, custom);
        let fallback =
            resolve_weights(&[&store, &BuiltinWeights], AlgorithmVersion::V6_0).unwrap();
        assert_eq!(fallback, AlgorithmVersion::V6_0.default_weights());
    }

    #[test]
    fn test_resolve_missing_and_invalid() {
        let empty = MemoryStore::new();
        assert!(matches!(
            resolve_weights(&[&empty], AlgorithmVersion::V7_1),
            Err(EngineError::MissingWeightVersion(_))
        ));
        let mut bad = AlgorithmVersion::V7_1.default_weights();
        bad.capability = 0.9;
        let store = MemoryStore::new().with_weights("v7.1", bad);
        assert!(matches!(
            resolve_weights(&[&store, &BuiltinWeights], AlgorithmVersion::V7_1),
            Err(EngineError::InvalidWeights { .. })
        ));
    }
}
