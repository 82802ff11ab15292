//! Completeness & confidence gate.
//!
//! Completeness is a weighted checklist over normalized evidence, so legacy
//! paths count the same as current ones. Confidence maps it linearly onto
//! `[0.7, 1.0]` and is applied once to the weighted sum.

use serde::{Deserialize, Serialize};

use crate::normalize::NormalizedEvidence;

pub const CONFIDENCE_FLOOR: f64 = 0.7;
pub const CONFIDENCE_SPAN: f64 = 0.3;
pub const MAX_COMPLETENESS: f64 = 100.0;

/// One checklist line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistItem {
    Benchmark,
    Usage,
    Revenue,
    Pricing,
    FundingOrValuation,
    GithubStars,
    Features,
    Description,
    LaunchDate,
    ContextWindow,
    Company,
}

impl ChecklistItem {
    pub const ALL: [ChecklistItem; 11] = [
        Self::Benchmark,
        Self::Usage,
        Self::Revenue,
        Self::Pricing,
        Self::FundingOrValuation,
        Self::GithubStars,
        Self::Features,
        Self::Description,
        Self::LaunchDate,
        Self::ContextWindow,
        Self::Company,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Benchmark => "benchmark",
            Self::Usage => "usage",
            Self::Revenue => "revenue",
            Self::Pricing => "pricing",
            Self::FundingOrValuation => "funding_or_valuation",
            Self::GithubStars => "github_stars",
            Self::Features => "features",
            Self::Description => "description",
            Self::LaunchDate => "launch_date",
            Self::ContextWindow => "context_window",
            Self::Company => "company",
        }
    }

    pub fn points(&self) -> f64 {
        match self {
            Self::Benchmark | Self::Usage | Self::Revenue => 20.0,
            Self::Pricing | Self::FundingOrValuation | Self::GithubStars => 15.0,
            Self::Features
            | Self::Description
            | Self::LaunchDate
            | Self::ContextWindow
            | Self::Company => 10.0,
        }
    }

    pub fn is_present(&self, ev: &NormalizedEvidence) -> bool {
        match self {
            Self::Benchmark => ev.benchmark_score.is_some(),
            Self::Usage => ev.usage().is_some(),
            Self::Revenue => ev.annual_revenue.is_some(),
            Self::Pricing => ev.pricing.is_some(),
            Self::FundingOrValuation => ev.total_funding.is_some() || ev.valuation.is_some(),
            Self::GithubStars => ev.github_stars.is_some(),
            Self::Features => ev.feature_count() > 0,
            Self::Description => ev.description.is_some(),
            Self::LaunchDate => ev.launch_date.is_some(),
            Self::ContextWindow => ev.context_window.is_some(),
            Self::Company => ev.company.is_some(),
        }
    }
}

/// Percentage of the checklist satisfied, in `[0, 100]`.
pub fn completeness(ev: &NormalizedEvidence) -> f64 {
    ChecklistItem::ALL
        .iter()
        .filter(|item| item.is_present(ev))
        .map(ChecklistItem::points)
        .sum::<f64>()
        .min(MAX_COMPLETENESS)
}

/// Checklist items the evidence does not satisfy.
pub fn missing(ev: &NormalizedEvidence) -> Vec<ChecklistItem> {
    ChecklistItem::ALL
        .into_iter()
        .filter(|item| !item.is_present(ev))
        .collect()
}

/// `0.7 + 0.3 × completeness / 100`
pub fn confidence_multiplier(completeness: f64) -> f64 {
    let c = completeness.clamp(0.0, MAX_COMPLETENESS);
    CONFIDENCE_FLOOR + CONFIDENCE_SPAN * c / MAX_COMPLETENESS
}
