//! Market traction: revenue (or the pricing model as a proxy), funding and
//! community proof.
//!
//! Evidence-gated: an entity with none of these scores zero.

use super::{FACTOR_MAX, ScoringInput, step};
use crate::normalize::{NormalizedEvidence, PricingTier};

const REVENUE_STEPS: &[(f64, f64)] = &[
    (1_000_000_000.0, 70.0),
    (500_000_000.0, 60.0),
    (100_000_000.0, 50.0),
    (50_000_000.0, 40.0),
    (10_000_000.0, 30.0),
    (1_000_000.0, 15.0),
];
const REVENUE_NONZERO: f64 = 5.0;

const COMMUNITY_STEPS: &[(f64, f64)] = &[(50_000.0, 10.0), (10_000.0, 5.0), (1_000.0, 2.0)];

fn pricing_points(tier: PricingTier) -> f64 {
    match tier {
        PricingTier::Enterprise => 30.0,
        PricingTier::Paid => 25.0,
        PricingTier::FreemiumWithPaid => 20.0,
        PricingTier::Freemium => 10.0,
        PricingTier::Free | PricingTier::Unknown => 0.0,
    }
}

fn revenue_points(revenue: f64) -> f64 {
    let points = step(revenue, REVENUE_STEPS);
    if points == 0.0 && revenue > 0.0 {
        REVENUE_NONZERO
    } else {
        points
    }
}

/// Funding tier from valuation and total funding.
pub fn funding_points(ev: &NormalizedEvidence) -> f64 {
    let valuation = ev.valuation.unwrap_or(0.0);
    let funding = ev.total_funding.unwrap_or(0.0);
    if valuation >= 10_000_000_000.0 {
        20.0
    } else if valuation >= 1_000_000_000.0 || funding >= 500_000_000.0 {
        15.0
    } else if funding >= 100_000_000.0 {
        10.0
    } else if funding >= 10_000_000.0 {
        5.0
    } else {
        0.0
    }
}

pub fn score(input: &ScoringInput) -> f64 {
    let ev = input.evidence;
    let commercial = match (ev.annual_revenue, ev.pricing) {
        (Some(revenue), _) => revenue_points(revenue),
        (None, Some(tier)) => pricing_points(tier),
        (None, None) => 0.0,
    };
    let community = ev
        .github_stars
        .map_or(0.0, |s| step(s as f64, COMMUNITY_STEPS));
    (commercial + funding_points(ev) + community).min(FACTOR_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::test_support::input;
    use toolrank_models::{Entity, NewsImpact};

    fn scored(ev: NormalizedEvidence) -> f64 {
        let entity = Entity::new("a", "A", "other");
        score(&input(&entity, &ev, &NewsImpact::default()))
    }

    #[test]
    fn test_revenue_beats_pricing_proxy() {
        let ev = NormalizedEvidence {
            annual_revenue: Some(120_000_000.0),
            pricing: Some(PricingTier::Enterprise),
            ..Default::default()
        };
        assert_eq!(scored(ev), 50.0);
    }

    #[test]
    fn test_small_revenue_still_counts() {
        let ev = NormalizedEvidence {
            annual_revenue: Some(250_000.0),
            ..Default::default()
        };
        assert_eq!(scored(ev), 5.0);
    }

    #[test]
    fn test_pricing_funding_and_community() {
        let ev = NormalizedEvidence {
            pricing: Some(PricingTier::FreemiumWithPaid),
            valuation: Some(2_500_000_000.0),
            github_stars: Some(12_000),
            ..Default::default()
        };
        assert_eq!(scored(ev), 20.0 + 15.0 + 5.0);
    }

    #[test]
    fn test_capped_at_max() {
        let ev = NormalizedEvidence {
            annual_revenue: Some(2_000_000_000.0),
            valuation: Some(30_000_000_000.0),
            github_stars: Some(80_000),
            ..Default::default()
        };
        assert_eq!(scored(ev), 100.0);
    }

    #[test]
    fn test_no_evidence_scores_zero() {
        assert_eq!(scored(NormalizedEvidence::default()), 0.0);
    }
}
