//! Technical depth: context window, language coverage and integrations.

use super::{ScoringInput, step};

const CONTEXT_ABSENT: f64 = 50.0;
const CONTEXT_STEPS: &[(f64, f64)] = &[
    (1_000_000.0, 80.0),
    (200_000.0, 70.0),
    (128_000.0, 60.0),
    (32_000.0, 50.0),
    (0.0, 40.0),
];
const LANGUAGE_POINTS: f64 = 0.5;
const LANGUAGE_CAP: f64 = 10.0;
const INTEGRATION_POINTS: f64 = 2.0;
const INTEGRATION_CAP: f64 = 10.0;

pub fn score(input: &ScoringInput) -> f64 {
    let ev = input.evidence;
    let context = match ev.context_window {
        Some(window) if window > 0 => step(window as f64, CONTEXT_STEPS),
        _ => CONTEXT_ABSENT,
    };
    let languages = ev
        .languages
        .map_or(0.0, |n| (LANGUAGE_POINTS * n as f64).min(LANGUAGE_CAP));
    let integrations = ev
        .integrations
        .map_or(0.0, |n| (INTEGRATION_POINTS * n as f64).min(INTEGRATION_CAP));
    context + languages + integrations
}
