//! Innovation: breadth of features, novel vocabulary and a launch-age curve.

use super::{ScoringInput, keyword_hits};

const BASELINE: f64 = 40.0;
const FEATURE_POINTS: f64 = 2.0;
const FEATURE_CAP: f64 = 20.0;
const VOCAB_POINTS: f64 = 4.0;
const VOCAB_CAP: f64 = 20.0;
const DAYS_PER_YEAR: f64 = 365.25;

const INNOVATION_VOCABULARY: &[&str] = &[
    "agentic",
    "autonomous",
    "multi-agent",
    "reasoning",
    "context-aware",
    "self-healing",
    "spec-driven",
    "background agent",
    "mcp",
    "first-ever",
];

/// Peaked launch-age bonus: young products are unproven, old ones stale.
pub fn recency_bonus(years_since_launch: f64) -> f64 {
    match years_since_launch {
        y if y < 0.0 => 0.0,
        y if y < 0.5 => 4.0,
        y if y < 1.0 => 8.0,
        y if y <= 3.0 => 15.0,
        y if y < 5.0 => 6.0,
        _ => 0.0,
    }
}

pub fn score(input: &ScoringInput) -> f64 {
    let ev = input.evidence;
    let features = (FEATURE_POINTS * ev.feature_count() as f64).min(FEATURE_CAP);
    let vocab = keyword_hits(&ev.searchable_text(), INNOVATION_VOCABULARY) as f64;
    let recency = ev.launch_date.map_or(0.0, |launch| {
        let days = (input.reference.date_naive() - launch).num_days() as f64;
        recency_bonus(days / DAYS_PER_YEAR)
    });
    BASELINE + features + (VOCAB_POINTS * vocab).min(VOCAB_CAP) + recency
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::test_support::input;
    use crate::normalize::NormalizedEvidence;
    use chrono::NaiveDate;
    use toolrank_models::{Entity, NewsImpact};

    #[test]
    fn test_recency_curve_is_peaked() {
        assert_eq!(recency_bonus(0.2), 4.0);
        assert_eq!(recency_bonus(0.7), 8.0);
        assert_eq!(recency_bonus(2.0), 15.0);
        assert_eq!(recency_bonus(4.0), 6.0);
        assert_eq!(recency_bonus(8.0), 0.0);
        assert_eq!(recency_bonus(-1.0), 0.0);
    }

    #[test]
    fn test_features_vocab_and_launch() {
        let entity = Entity::new("a", "A", "other");
        let ev = NormalizedEvidence {
            features: Some((0..15).map(|i| format!("feature {}", i)).collect()),
            description: Some("Agentic, multi-agent reasoning".into()),
            launch_date: NaiveDate::from_ymd_opt(2023, 6, 1),
            ..Default::default()
        };
        let news = NewsImpact::default();
        // 40 + 20 (capped) + 12 (agentic, multi-agent, reasoning) + 15 (2 years)
        assert_eq!(score(&input(&entity, &ev, &news)), 87.0);
    }

    #[test]
    fn test_future_launch_gets_no_bonus() {
        let entity = Entity::new("a", "A", "other");
        let ev = NormalizedEvidence {
            launch_date: NaiveDate::from_ymd_opt(2030, 1, 1),
            ..Default::default()
        };
        let news = NewsImpact::default();
        assert_eq!(score(&input(&entity, &ev, &news)), 40.0);
    }
}
