//! Velocity: lifecycle status, feature breadth, release cadence and recent
//! press activity.

use toolrank_models::LifecycleStatus;

use super::{FACTOR_MAX, ScoringInput};

const FEATURE_CAP: f64 = 20.0;
const UPDATE_POINTS: f64 = 4.0;
const UPDATE_CAP: f64 = 20.0;
const RECENT_PRESS_THRESHOLD: u32 = 3;
const RECENT_PRESS_BONUS: f64 = 5.0;

pub fn status_baseline(status: LifecycleStatus) -> f64 {
    match status {
        LifecycleStatus::Active => 50.0,
        LifecycleStatus::Beta => 55.0,
        LifecycleStatus::Acquired => 30.0,
        LifecycleStatus::Discontinued => 5.0,
    }
}

pub fn score(input: &ScoringInput) -> f64 {
    let ev = input.evidence;
    let features = (ev.feature_count() as f64).min(FEATURE_CAP);
    let updates = ev
        .recent_updates
        .map_or(0.0, |n| (UPDATE_POINTS * n as f64).min(UPDATE_CAP));
    let press = if input.news.recent_mentions >= RECENT_PRESS_THRESHOLD {
        RECENT_PRESS_BONUS
    } else {
        0.0
    };
    (status_baseline(ev.status) + features + updates + press).min(FACTOR_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::test_support::input;
    use crate::normalize::NormalizedEvidence;
    use toolrank_models::{Entity, NewsImpact};

    #[test]
    fn test_discontinued_scores_low() {
        let entity = Entity::new("a", "A", "other");
        let ev = NormalizedEvidence {
            status: LifecycleStatus::Discontinued,
            ..Default::default()
        };
        assert_eq!(score(&input(&entity, &ev, &NewsImpact::default())), 5.0);
    }

    #[test]
    fn test_busy_beta_is_capped() {
        let entity = Entity::new("a", "A", "other");
        let ev = NormalizedEvidence {
            status: LifecycleStatus::Beta,
            features: Some((0..30).map(|i| i.to_string()).collect()),
            recent_updates: Some(4),
            ..Default::default()
        };
        let news = NewsImpact {
            recent_mentions: 3,
            total_mentions: 3,
            ..NewsImpact::default()
        };
        // 55 + 20 + 16 + 5
        assert_eq!(score(&input(&entity, &ev, &news)), 96.0);
    }
}
