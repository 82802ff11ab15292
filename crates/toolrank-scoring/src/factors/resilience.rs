//! Resilience: how well a tool would survive losing one supplier.

use super::{FACTOR_MAX, ScoringInput};
use crate::normalize::NormalizedEvidence;

const OPEN_ECOSYSTEM_BONUS: f64 = 15.0;
const FREE_TIER_BONUS: f64 = 5.0;
const BACKING_SHARE: f64 = 0.5;

const MAJOR_BACKERS: &[&str] = &[
    "microsoft",
    "github",
    "google",
    "amazon",
    "aws",
    "meta",
    "openai",
    "anthropic",
    "jetbrains",
    "alibaba",
];

fn provider_points(providers: Option<u64>) -> f64 {
    match providers.unwrap_or(0) {
        0 | 1 => 40.0,
        2 => 55.0,
        _ => 70.0,
    }
}

/// 20 for a major platform backer, 15 for funding of at least 100M, 5 for
/// any named company, otherwise 0.
pub fn company_backing_score(ev: &NormalizedEvidence) -> f64 {
    let company = ev.company.as_deref().map(str::to_lowercase);
    if company
        .as_deref()
        .is_some_and(|c| MAJOR_BACKERS.iter().any(|b| c.contains(b)))
    {
        20.0
    } else if ev.total_funding.is_some_and(|f| f >= 100_000_000.0) {
        15.0
    } else if company.is_some() {
        5.0
    } else {
        0.0
    }
}

pub fn score(input: &ScoringInput) -> f64 {
    let ev = input.evidence;
    let open = if ev.open_source == Some(true) {
        OPEN_ECOSYSTEM_BONUS
    } else {
        0.0
    };
    let free = if ev.has_free_tier() { FREE_TIER_BONUS } else { 0.0 };
    (provider_points(ev.llm_providers) + open + free + BACKING_SHARE * company_backing_score(ev))
        .min(FACTOR_MAX)
}
