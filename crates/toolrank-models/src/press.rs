//! Press items and the per-entity news impact summary derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Editorial category of a press item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressKind {
    Funding,
    Acquisition,
    ProductLaunch,
    Benchmark,
    Partnership,
    Research,
    Review,
    /// Vendor announcement / press release.
    Announcement,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceTier {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketImpactTier {
    High,
    Medium,
    Low,
    #[default]
    None,
}

/// How central the entity is to the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    Primary,
    Secondary,
    Mentioned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
    Mixed,
}

/// One entity mentioned by a press item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub entity_id: String,
    pub relevance: Relevance,
    #[serde(default)]
    pub sentiment: Sentiment,
}

/// An external publication mentioning one or more entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressItem {
    pub id: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub kind: PressKind,
    #[serde(default)]
    pub importance: ImportanceTier,
    #[serde(default)]
    pub market_impact: MarketImpactTier,
    /// Published by the vendor itself (blog post, press release).
    #[serde(default)]
    pub self_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

impl PressItem {
    /// Self-published items and vendor announcements get the PR discount.
    pub fn is_promotional(&self) -> bool {
        self.self_published || self.kind == PressKind::Announcement
    }

    pub fn mention_of(&self, entity_id: &str) -> Option<&Mention> {
        self.mentions.iter().find(|m| m.entity_id == entity_id)
    }
}

/// Decayed press impact on one entity as of a reference time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NewsImpact {
    /// Sum of decayed, discounted mention weights (volume, never negative).
    pub total_impact: f64,
    pub positive_impact: f64,
    pub negative_impact: f64,
    /// `positive_impact - negative_impact`
    pub net_impact: f64,
    pub total_mentions: u32,
    /// Mentions no older than the recency window.
    pub recent_mentions: u32,
}

impl NewsImpact {
    pub fn is_empty(&self) -> bool {
        self.total_mentions == 0
    }
}
