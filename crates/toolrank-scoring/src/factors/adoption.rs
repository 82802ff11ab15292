//! Adoption: reported usage, press volume and GitHub stars.
//!
//! Evidence-gated: an entity with none of these scores zero.

use super::{FACTOR_MAX, ScoringInput, step};

pub const USAGE_STEPS: &[(f64, f64)] = &[
    (20_000_000.0, 60.0),
    (5_000_000.0, 50.0),
    (1_000_000.0, 40.0),
    (250_000.0, 30.0),
    (50_000.0, 20.0),
    (10_000.0, 10.0),
    (1_000.0, 5.0),
];

pub const PRESS_STEPS: &[(f64, f64)] = &[(50.0, 15.0), (20.0, 10.0), (5.0, 5.0), (1.0, 2.0)];

pub const STAR_STEPS: &[(f64, f64)] = &[
    (100_000.0, 20.0),
    (50_000.0, 15.0),
    (20_000.0, 10.0),
    (5_000.0, 5.0),
    (1_000.0, 2.0),
];

pub fn score(input: &ScoringInput) -> f64 {
    let ev = input.evidence;
    let usage = ev.usage().map_or(0.0, |u| step(u as f64, USAGE_STEPS));
    let press = step(input.press_count as f64, PRESS_STEPS);
    let stars = ev.github_stars.map_or(0.0, |s| step(s as f64, STAR_STEPS));
    (usage + press + stars).min(FACTOR_MAX)
}
