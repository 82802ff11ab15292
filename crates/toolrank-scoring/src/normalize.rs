//! Evidence normalization.
//!
//! Every logical fact has an ordered list of storage paths (current layout
//! first, legacy layouts after). The first path holding a non-null value
//! wins; it is parsed once into [`NormalizedEvidence`] and scorers read only
//! that record.
//!
//! A winning value that cannot be parsed is NOT skipped in favour of a later
//! path: the field is treated as absent and an [`EvidenceIssue`] is recorded.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use toolrank_models::{Entity, EvidenceBlob, EvidenceIssue, LifecycleStatus};

/// Logical evidence fields read by the scorers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    BenchmarkScore,
    ContextWindow,
    Languages,
    Integrations,
    LlmProviders,
    Users,
    Installs,
    GithubStars,
    PressMentions,
    AnnualRevenue,
    PricingModel,
    TotalFunding,
    Valuation,
    Company,
    OpenSource,
    FreeTier,
    Features,
    RecentUpdates,
    Description,
    LaunchDate,
    Status,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BenchmarkScore => "benchmark_score",
            Self::ContextWindow => "context_window",
            Self::Languages => "languages",
            Self::Integrations => "integrations",
            Self::LlmProviders => "llm_providers",
            Self::Users => "users",
            Self::Installs => "installs",
            Self::GithubStars => "github_stars",
            Self::PressMentions => "press_mentions",
            Self::AnnualRevenue => "annual_revenue",
            Self::PricingModel => "pricing_model",
            Self::TotalFunding => "total_funding",
            Self::Valuation => "valuation",
            Self::Company => "company",
            Self::OpenSource => "open_source",
            Self::FreeTier => "free_tier",
            Self::Features => "features",
            Self::RecentUpdates => "recent_updates",
            Self::Description => "description",
            Self::LaunchDate => "launch_date",
            Self::Status => "status",
        }
    }

    /// Lookup paths, first match wins.
    pub fn paths(&self) -> &'static [&'static str] {
        match self {
            Self::BenchmarkScore => &[
                "metrics.swe_bench.verified",
                "info.metrics.swe_bench_score",
                "benchmarks.swe_bench",
                "swe_bench_score",
            ],
            Self::ContextWindow => &[
                "info.technical.context_window",
                "technical.context_window",
                "context_window",
            ],
            Self::Languages => &[
                "info.technical.language_support",
                "technical.languages",
                "supported_languages",
            ],
            Self::Integrations => &[
                "info.integrations",
                "info.technical.ide_integrations",
                "integrations",
            ],
            Self::LlmProviders => &[
                "info.technical.llm_providers",
                "technical.models",
                "llm_providers",
            ],
            Self::Users => &["metrics.users", "info.metrics.users", "adoption.users", "users"],
            Self::Installs => &[
                "metrics.vscode_installs",
                "metrics.npm_downloads",
                "info.metrics.installs",
                "installs",
            ],
            Self::GithubStars => &[
                "metrics.github_stars",
                "info.metrics.github_stars",
                "github.stars",
                "stars",
            ],
            Self::PressMentions => &[
                "metrics.news_mentions",
                "info.metrics.news_mentions",
                "news_mentions",
            ],
            Self::AnnualRevenue => &[
                "metrics.arr",
                "info.business.arr",
                "business.annual_recurring_revenue",
                "revenue",
            ],
            Self::PricingModel => &[
                "info.business.pricing_model",
                "business.pricing_model",
                "pricing.model",
                "pricing_model",
            ],
            Self::TotalFunding => &[
                "info.business.total_funding",
                "metrics.funding",
                "business.funding",
                "funding_total",
            ],
            Self::Valuation => &["info.business.valuation", "metrics.valuation", "valuation"],
            Self::Company => &[
                "info.company",
                "info.business.parent_company",
                "company",
                "developer",
            ],
            Self::OpenSource => &["info.technical.open_source", "open_source"],
            Self::FreeTier => &[
                "info.business.free_tier",
                "business.has_free_tier",
                "free_tier",
            ],
            Self::Features => &["info.features", "info.product.features", "features"],
            Self::RecentUpdates => &["info.recent_updates", "recent_updates", "changelog"],
            Self::Description => &[
                "info.description",
                "info.summary",
                "description",
                "tagline",
            ],
            Self::LaunchDate => &["info.launch_date", "launch_date", "founded"],
            Self::Status => &["status", "info.status"],
        }
    }
}

/// Commercial model, ordered from strongest to weakest revenue signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingTier {
    Enterprise,
    Paid,
    FreemiumWithPaid,
    Freemium,
    Free,
    Unknown,
}

impl PricingTier {
    pub fn has_free_entry(&self) -> bool {
        matches!(self, Self::Free | Self::Freemium | Self::FreemiumWithPaid)
    }
}

impl FromStr for PricingTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let key = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        match key.as_str() {
            "enterprise" | "enterprise_only" | "custom" => Ok(Self::Enterprise),
            "paid" | "subscription" | "commercial" | "usage_based" | "pay_as_you_go" => {
                Ok(Self::Paid)
            }
            "freemium_with_paid" | "freemium_paid" | "free_paid" | "free_and_paid" | "free_trial" => {
                Ok(Self::FreemiumWithPaid)
            }
            "freemium" => Ok(Self::Freemium),
            "free" | "free_only" | "open_source" => Ok(Self::Free),
            "unknown" | "" => Ok(Self::Unknown),
            other => Err(format!("unrecognized pricing model '{}'", other)),
        }
    }
}

/// Typed view of one entity's evidence after fallback resolution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedEvidence {
    /// SWE-bench style percentage in `[0, 100]`.
    pub benchmark_score: Option<f64>,
    pub context_window: Option<u64>,
    pub languages: Option<u64>,
    pub integrations: Option<u64>,
    pub llm_providers: Option<u64>,
    pub users: Option<u64>,
    pub installs: Option<u64>,
    pub github_stars: Option<u64>,
    pub press_mentions: Option<u64>,
    /// USD per year.
    pub annual_revenue: Option<f64>,
    pub pricing: Option<PricingTier>,
    pub total_funding: Option<f64>,
    pub valuation: Option<f64>,
    pub company: Option<String>,
    pub open_source: Option<bool>,
    pub free_tier: Option<bool>,
    pub features: Option<Vec<String>>,
    pub recent_updates: Option<u64>,
    pub description: Option<String>,
    pub launch_date: Option<NaiveDate>,
    pub status: LifecycleStatus,
    pub issues: Vec<EvidenceIssue>,
}

impl NormalizedEvidence {
    /// Resolve an entity's blob into typed evidence.
    pub fn from_entity(entity: &Entity) -> Self {
        let mut r = Resolver {
            blob: &entity.evidence,
            issues: Vec::new(),
        };
        let status = r.resolve(Field::Status, parse_status).unwrap_or(entity.status);
        Self {
            benchmark_score: r.resolve(Field::BenchmarkScore, parse_percentage),
            context_window: r.resolve(Field::ContextWindow, parse_count),
            languages: r.resolve(Field::Languages, parse_count_or_list),
            integrations: r.resolve(Field::Integrations, parse_count_or_list),
            llm_providers: r.resolve(Field::LlmProviders, parse_count_or_list),
            users: r.resolve(Field::Users, parse_count),
            installs: r.resolve(Field::Installs, parse_count),
            github_stars: r.resolve(Field::GithubStars, parse_count),
            press_mentions: r.resolve(Field::PressMentions, parse_count),
            annual_revenue: r.resolve(Field::AnnualRevenue, parse_amount),
            pricing: r.resolve(Field::PricingModel, parse_pricing),
            total_funding: r.resolve(Field::TotalFunding, parse_amount),
            valuation: r.resolve(Field::Valuation, parse_amount),
            company: r.resolve(Field::Company, parse_text),
            open_source: r.resolve(Field::OpenSource, parse_bool),
            free_tier: r.resolve(Field::FreeTier, parse_bool),
            features: r.resolve(Field::Features, parse_string_list),
            recent_updates: r.resolve(Field::RecentUpdates, parse_count_or_list),
            description: r.resolve(Field::Description, parse_text),
            launch_date: r.resolve(Field::LaunchDate, parse_date),
            status,
            issues: r.issues,
        }
    }

    pub fn feature_count(&self) -> u64 {
        self.features.as_ref().map_or(0, |f| f.len() as u64)
    }

    /// Largest of reported users and installs.
    pub fn usage(&self) -> Option<u64> {
        match (self.users, self.installs) {
            (Some(u), Some(i)) => Some(u.max(i)),
            (u, i) => u.or(i),
        }
    }

    /// Lowercase description plus feature names, for keyword matching.
    pub fn searchable_text(&self) -> String {
        let mut text = self.description.clone().unwrap_or_default();
        if let Some(features) = &self.features {
            for f in features {
                text.push(' ');
                text.push_str(f);
            }
        }
        text.to_lowercase()
    }

    /// Free entry point, from the explicit flag or the pricing model.
    pub fn has_free_tier(&self) -> bool {
        self.free_tier
            .unwrap_or_else(|| self.pricing.is_some_and(|p| p.has_free_entry()))
    }
}

struct Resolver<'a> {
    blob: &'a EvidenceBlob,
    issues: Vec<EvidenceIssue>,
}

impl Resolver<'_> {
    fn resolve<T>(&mut self, field: Field, parse: fn(&Value) -> Result<T, String>) -> Option<T> {
        let (path, value) = field
            .paths()
            .iter()
            .find_map(|p| self.blob.lookup(p).map(|v| (*p, v)))?;
        match parse(value) {
            Ok(v) => Some(v),
            Err(reason) => {
                self.issues
                    .push(EvidenceIssue::malformed(field.as_str(), path, reason));
                None
            }
        }
    }
}

fn parse_scaled_number(raw: &str) -> Result<f64, String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | '$' | '+' | ' '))
        .collect();
    let lower = cleaned.to_ascii_lowercase();
    let (digits, multiplier) = match lower.chars().last() {
        Some('k') => (&lower[..lower.len() - 1], 1e3),
        Some('m') => (&lower[..lower.len() - 1], 1e6),
        Some('b') => (&lower[..lower.len() - 1], 1e9),
        _ => (lower.as_str(), 1.0),
    };
    digits
        .parse::<f64>()
        .map(|v| v * multiplier)
        .map_err(|_| format!("not a number: '{}'", raw))
}

fn parse_non_negative(value: &Value) -> Result<f64, String> {
    let v = match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| "number out of range".to_string())?,
        Value::String(s) => parse_scaled_number(s)?,
        other => return Err(format!("expected number, found {}", json_type(other))),
    };
    if !v.is_finite() || v < 0.0 {
        return Err(format!("expected non-negative number, found {}", v));
    }
    Ok(v)
}

fn parse_count(value: &Value) -> Result<u64, String> {
    parse_non_negative(value).map(|v| v.round() as u64)
}

fn parse_count_or_list(value: &Value) -> Result<u64, String> {
    match value {
        Value::Array(items) => Ok(items.len() as u64),
        other => parse_count(other),
    }
}

fn parse_amount(value: &Value) -> Result<f64, String> {
    parse_non_negative(value)
}

fn parse_percentage(value: &Value) -> Result<f64, String> {
    let v = match value {
        Value::String(s) => parse_non_negative(&Value::String(s.trim_end_matches('%').to_string()))?,
        other => parse_non_negative(other)?,
    };
    if v > 100.0 {
        return Err(format!("percentage above 100: {}", v));
    }
    Ok(v)
}

fn parse_text(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Value::String(_) => Err("empty string".to_string()),
        other => Err(format!("expected string, found {}", json_type(other))),
    }
}

fn parse_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" => Ok(true),
            "false" | "no" | "n" => Ok(false),
            other => Err(format!("expected boolean, found '{}'", other)),
        },
        other => Err(format!("expected boolean, found {}", json_type(other))),
    }
}

fn parse_pricing(value: &Value) -> Result<PricingTier, String> {
    parse_text(value)?.parse()
}

fn parse_status(value: &Value) -> Result<LifecycleStatus, String> {
    parse_text(value)?.parse()
}

/// Strings, or objects carrying a `name`; anything else in the list is dropped.
fn parse_string_list(value: &Value) -> Result<Vec<String>, String> {
    let Value::Array(items) = value else {
        return Err(format!("expected list, found {}", json_type(value)));
    };
    Ok(items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string()),
            _ => None,
        })
        .collect())
}

fn parse_date(value: &Value) -> Result<NaiveDate, String> {
    let year_start = |y: i64| -> Result<NaiveDate, String> {
        i32::try_from(y)
            .ok()
            .filter(|y| (1970..=2100).contains(y))
            .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
            .ok_or_else(|| format!("year out of range: {}", y))
    };
    match value {
        Value::Number(n) => year_start(n.as_i64().ok_or("expected integer year")?),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Ok(d);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.date_naive());
            }
            if let Ok(d) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
                return Ok(d);
            }
            match s.parse::<i64>() {
                Ok(y) => year_start(y),
                Err(_) => Err(format!("unrecognized date '{}'", s)),
            }
        }
        other => Err(format!("expected date, found {}", json_type(other))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
