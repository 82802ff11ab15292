//! Capability: what the tool can do today.
//!
//! Without a benchmark, the score is built from the category and agentic
//! keywords in the description and features. A published benchmark maps to
//! `20 + 0.8 × bench` and is floored at that heuristic, so publishing one
//! never costs points against an otherwise identical silent entity.

use super::{ScoringInput, keyword_hits};

const BENCHMARK_FLOOR: f64 = 20.0;
const BENCHMARK_SLOPE: f64 = 0.8;
const BASELINE: f64 = 50.0;
const KEYWORD_POINTS: f64 = 3.0;
const KEYWORD_CAP: f64 = 15.0;

const AGENTIC_KEYWORDS: &[&str] = &[
    "agent",
    "autonomous",
    "multi-file",
    "codebase",
    "terminal",
    "planning",
    "tool use",
    "mcp",
];

fn category_bonus(category: &str) -> f64 {
    match category {
        "autonomous-agent" => 20.0,
        "ide-assistant" | "code-editor" => 10.0,
        "app-builder" | "code-review" => 5.0,
        _ => 0.0,
    }
}

fn heuristic(input: &ScoringInput) -> f64 {
    let hits = keyword_hits(&input.evidence.searchable_text(), AGENTIC_KEYWORDS) as f64;
    BASELINE + category_bonus(&input.category()) + (KEYWORD_POINTS * hits).min(KEYWORD_CAP)
}

pub fn score(input: &ScoringInput) -> f64 {
    let base = heuristic(input);
    match input.evidence.benchmark_score {
        Some(bench) => (BENCHMARK_FLOOR + BENCHMARK_SLOPE * bench).max(base),
        None => base,
    }
}
