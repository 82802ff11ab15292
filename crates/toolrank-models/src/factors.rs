//! The eight scoring dimensions and a per-entity set of factor scores.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::weights::WeightTable;

/// One scored aspect of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Capability,
    Innovation,
    TechnicalDepth,
    Adoption,
    MarketTraction,
    Sentiment,
    Velocity,
    Resilience,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::Capability,
        Dimension::Innovation,
        Dimension::TechnicalDepth,
        Dimension::Adoption,
        Dimension::MarketTraction,
        Dimension::Sentiment,
        Dimension::Velocity,
        Dimension::Resilience,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capability => "capability",
            Self::Innovation => "innovation",
            Self::TechnicalDepth => "technical_depth",
            Self::Adoption => "adoption",
            Self::MarketTraction => "market_traction",
            Self::Sentiment => "sentiment",
            Self::Velocity => "velocity",
            Self::Resilience => "resilience",
        }
    }

    /// Dimensions where absence of proof scores zero.
    pub fn is_evidence_gated(&self) -> bool {
        matches!(self, Self::Adoption | Self::MarketTraction)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly eight named sub-scores for one entity in one run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FactorScores {
    pub capability: f64,
    pub innovation: f64,
    pub technical_depth: f64,
    pub adoption: f64,
    pub market_traction: f64,
    pub sentiment: f64,
    pub velocity: f64,
    pub resilience: f64,
}

impl FactorScores {
    pub fn get(&self, dim: Dimension) -> f64 {
        match dim {
            Dimension::Capability => self.capability,
            Dimension::Innovation => self.innovation,
            Dimension::TechnicalDepth => self.technical_depth,
            Dimension::Adoption => self.adoption,
            Dimension::MarketTraction => self.market_traction,
            Dimension::Sentiment => self.sentiment,
            Dimension::Velocity => self.velocity,
            Dimension::Resilience => self.resilience,
        }
    }

    pub fn set(&mut self, dim: Dimension, value: f64) {
        let slot = match dim {
            Dimension::Capability => &mut self.capability,
            Dimension::Innovation => &mut self.innovation,
            Dimension::TechnicalDepth => &mut self.technical_depth,
            Dimension::Adoption => &mut self.adoption,
            Dimension::MarketTraction => &mut self.market_traction,
            Dimension::Sentiment => &mut self.sentiment,
            Dimension::Velocity => &mut self.velocity,
            Dimension::Resilience => &mut self.resilience,
        };
        *slot = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.into_iter().map(|d| (d, self.get(d)))
    }

    /// Apply `f` to every dimension.
    pub fn map(&self, mut f: impl FnMut(Dimension, f64) -> f64) -> Self {
        let mut out = Self::default();
        for (dim, value) in self.iter() {
            out.set(dim, f(dim, value));
        }
        out
    }

    /// `Σ factor_i × weight_i`
    pub fn weighted_sum(&self, weights: &WeightTable) -> f64 {
        self.iter().map(|(d, v)| v * weights.get(d)).sum()
    }
}
