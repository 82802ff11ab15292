//! Tiebreak resolver.
//!
//! The rounded base score is a whole number of precision steps `U`. A
//! positional nudge strictly below `U` is added so that no two entities in
//! a run share a final score:
//!
//! ```text
//! fraction = feature/10 + description/100 + pricing/1000 + alpha/1000
//! alpha    = (N - index) / (N + 1)          in (0, 1)
//! score    = (steps + fraction) × U
//! ```
//!
//! ## Invariants
//! - Each category's maximum is below the next larger category's step
//! - `fraction < 1`, so the nudge never crosses into the next real step
//! - Distinct alphabetical indices make every fraction distinct

use toolrank_models::TiebreakBreakdown;

use crate::normalize::{NormalizedEvidence, PricingTier};
use crate::versions::VersionProfile;

const MAX_DIGIT: u64 = 9;
const DESCRIPTION_CHARS_PER_DIGIT: u64 = 50;

/// Evidence-derived digits of the nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TiebreakDigits {
    pub feature: u8,
    pub description: u8,
    pub pricing: u8,
}

pub fn pricing_digit(pricing: Option<PricingTier>) -> u8 {
    match pricing {
        Some(PricingTier::Enterprise) => 4,
        Some(PricingTier::Paid) => 3,
        Some(PricingTier::FreemiumWithPaid) => 2,
        Some(PricingTier::Freemium) => 1,
        Some(PricingTier::Free | PricingTier::Unknown) | None => 0,
    }
}

pub fn digits(ev: &NormalizedEvidence) -> TiebreakDigits {
    let description_len = ev
        .description
        .as_deref()
        .map_or(0, |d| d.chars().count() as u64);
    TiebreakDigits {
        feature: ev.feature_count().min(MAX_DIGIT) as u8,
        description: (description_len / DESCRIPTION_CHARS_PER_DIGIT).min(MAX_DIGIT) as u8,
        pricing: pricing_digit(ev.pricing),
    }
}

/// Position of each key in sorted order, reported per input slot.
pub fn alphabetical_indices<K: Ord>(keys: &[K]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    let mut indices = vec![0u32; keys.len()];
    for (position, slot) in order.into_iter().enumerate() {
        indices[slot] = position as u32;
    }
    indices
}

/// Nudge as a fraction of one precision step, in `[0, 1)`.
pub fn nudge_fraction(digits: TiebreakDigits, alphabetical_index: u32, population: usize) -> f64 {
    let n = population as f64;
    let alpha = (n - f64::from(alphabetical_index)) / (n + 1.0);
    f64::from(digits.feature) / 10.0
        + f64::from(digits.description) / 100.0
        + f64::from(digits.pricing) / 1_000.0
        + alpha / 1_000.0
}

/// Rounded step count for an adjusted score, kept below the maximum.
pub fn base_steps(adjusted: f64, profile: &VersionProfile) -> i64 {
    let steps = if adjusted.is_finite() {
        (adjusted / profile.precision).round() as i64
    } else {
        0
    };
    steps.clamp(0, profile.max_steps() - 1)
}

/// Final score and its breakdown.
pub fn resolve(
    adjusted: f64,
    digits: TiebreakDigits,
    alphabetical_index: u32,
    population: usize,
    profile: &VersionProfile,
) -> (f64, TiebreakBreakdown) {
    let steps = base_steps(adjusted, profile);
    let fraction = nudge_fraction(digits, alphabetical_index, population);
    let score = (steps as f64 + fraction) * profile.precision;
    let breakdown = TiebreakBreakdown {
        feature_digit: digits.feature,
        description_digit: digits.description,
        pricing_digit: digits.pricing,
        alphabetical_index,
        nudge: fraction * profile.precision,
    };
    (score, breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versions::AlgorithmVersion;
    use std::collections::HashSet;

    fn max_digits() -> TiebreakDigits {
        TiebreakDigits {
            feature: 9,
            description: 9,
            pricing: 4,
        }
    }

    #[test]
    fn test_fraction_stays_below_one_step() {
        assert!(nudge_fraction(max_digits(), 0, 1_000) < 1.0);
        assert!(nudge_fraction(TiebreakDigits::default(), 999, 1_000) > 0.0);
    }

    #[test]
    fn test_category_ordering() {
        let more_features = TiebreakDigits {
            feature: 1,
            ..Default::default()
        };
        let everything_else = TiebreakDigits {
            feature: 0,
            description: 9,
            pricing: 4,
        };
        assert!(nudge_fraction(more_features, 9, 10) > nudge_fraction(everything_else, 0, 10));
    }

    #[test]
    fn test_alphabetical_indices() {
        let keys = vec![("zed", "z"), ("aider", "a"), ("cline", "c")];
        assert_eq!(alphabetical_indices(&keys), vec![2, 0, 1]);
    }

    #[test]
    fn test_equal_inputs_get_distinct_scores() {
        let profile = AlgorithmVersion::V7_0.profile();
        let n = 50;
        let scores: HashSet<u64> = (0..n)
            .map(|i| resolve(42.0, max_digits(), i as u32, n, &profile).0.to_bits())
            .collect();
        assert_eq!(scores.len(), n);
    }

    #[test]
    fn test_score_below_max() {
        let profile = AlgorithmVersion::V6_0.profile();
        let (score, _) = resolve(10.0, max_digits(), 0, 3, &profile);
        assert!(score < profile.max_score);
        let (low, _) = resolve(-5.0, TiebreakDigits::default(), 2, 3, &profile);
        assert!(low >= 0.0);
    }
}
