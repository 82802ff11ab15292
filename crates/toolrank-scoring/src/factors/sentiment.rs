//! Sentiment: press volume, decayed net news impact, category and traction.
//!
//! The news adjustment is scaled by the version's sentiment share, so a
//! distributed strategy leaves room for the side nudges.

use super::{FACTOR_MAX, ScoringInput, step};
use crate::versions::NEWS_POINTS_PER_IMPACT;

const BASELINE: f64 = 50.0;
const NEWS_ADJUSTMENT_CAP: f64 = 30.0;
const VOLUME_STEPS: &[(f64, f64)] = &[(100.0, 10.0), (50.0, 7.0), (20.0, 5.0), (5.0, 2.0)];
const CATEGORY_BONUS: f64 = 5.0;
const TRACTION_BONUS: f64 = 5.0;

/// Points moved by net news impact after the sentiment share is applied.
pub fn news_adjustment(net_impact: f64, share: f64) -> f64 {
    (NEWS_POINTS_PER_IMPACT * net_impact * share).clamp(-NEWS_ADJUSTMENT_CAP, NEWS_ADJUSTMENT_CAP)
}

pub fn score(input: &ScoringInput) -> f64 {
    let ev = input.evidence;
    let volume = step(input.press_count as f64, VOLUME_STEPS);
    let news = news_adjustment(input.news.net_impact, input.news_strategy.sentiment_share());
    let category = match input.category().as_str() {
        "autonomous-agent" | "ide-assistant" => CATEGORY_BONUS,
        _ => 0.0,
    };
    let high_traction = ev.usage().is_some_and(|u| u >= 1_000_000)
        || ev.annual_revenue.is_some_and(|r| r >= 100_000_000.0);
    let traction = if high_traction { TRACTION_BONUS } else { 0.0 };
    (BASELINE + volume + news + category + traction).clamp(0.0, FACTOR_MAX)
}
