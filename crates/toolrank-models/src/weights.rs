//! Per-version weight tables.

use serde::{Deserialize, Serialize};

use crate::factors::Dimension;

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightError {
    #[error("weight for {dimension} is invalid: {value}")]
    InvalidWeight { dimension: Dimension, value: f64 },

    #[error("weights sum to {sum}, expected 1.0")]
    BadSum { sum: f64 },
}

/// Eight named weights; a valid table sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub capability: f64,
    pub innovation: f64,
    pub technical_depth: f64,
    pub adoption: f64,
    pub market_traction: f64,
    pub sentiment: f64,
    pub velocity: f64,
    pub resilience: f64,
}

impl WeightTable {
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

    pub fn sum(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.get(*d)).sum()
    }

    pub fn validate(&self) -> Result<(), WeightError> {
        for dim in Dimension::ALL {
            let value = self.get(dim);
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(WeightError::InvalidWeight {
                    dimension: dim,
                    value,
                });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightError::BadSum { sum });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform() -> WeightTable {
        WeightTable {
            capability: 0.125,
            innovation: 0.125,
            technical_depth: 0.125,
            adoption: 0.125,
            market_traction: 0.125,
            sentiment: 0.125,
            velocity: 0.125,
            resilience: 0.125,
        }
    }

    #[test]
    fn test_uniform_table_is_valid() {
        assert!(uniform().validate().is_ok());
    }

    #[test]
    fn test_bad_sum_rejected() {
        let mut w = uniform();
        w.capability = 0.2;
        assert!(matches!(w.validate(), Err(WeightError::BadSum { .. })));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut w = uniform();
        w.capability = -0.125;
        w.innovation = 0.375;
        assert!(matches!(
            w.validate(),
            Err(WeightError::InvalidWeight {
                dimension: Dimension::Capability,
                ..
            })
        ));
    }
}
