//! News/press impact.
//!
//! ## Pipeline (fixed order)
//! 1. `base = min(100, importance + market impact + kind)`
//! 2. `weighted = base × (1 + polarity × relevance)`; the signed sentiment
//!    component is `weighted − base`
//! 3. age decay `× 0.5^(age_days / half_life_days)`
//! 4. PR discount for self-published items and vendor announcements
//!
//! The signed component may be negative, so the stages are applied in this
//! order and never rearranged.
//!
//! Items published after the reference time do not exist for that run.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use toolrank_models::{
    ImportanceTier, MarketImpactTier, Mention, NewsImpact, PressItem, PressKind, Relevance,
    Sentiment,
};

use crate::versions::AdoptionPressPolicy;

pub const DEFAULT_HALF_LIFE_DAYS: f64 = 90.0;
pub const RECENT_WINDOW_DAYS: f64 = 30.0;
pub const PR_DISCOUNT: f64 = 0.5;
pub const MAX_BASE_IMPACT: f64 = 100.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewsConfig {
    pub half_life_days: f64,
    pub recent_window_days: f64,
    pub pr_discount: f64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
            recent_window_days: RECENT_WINDOW_DAYS,
            pr_discount: PR_DISCOUNT,
        }
    }
}

fn importance_points(tier: ImportanceTier) -> f64 {
    match tier {
        ImportanceTier::Critical => 40.0,
        ImportanceTier::High => 30.0,
        ImportanceTier::Medium => 20.0,
        ImportanceTier::Low => 10.0,
    }
}

fn market_points(tier: MarketImpactTier) -> f64 {
    match tier {
        MarketImpactTier::High => 30.0,
        MarketImpactTier::Medium => 20.0,
        MarketImpactTier::Low => 10.0,
        MarketImpactTier::None => 0.0,
    }
}

fn kind_points(kind: PressKind) -> f64 {
    match kind {
        PressKind::Funding | PressKind::Acquisition => 30.0,
        PressKind::ProductLaunch | PressKind::Benchmark => 25.0,
        PressKind::Partnership | PressKind::Research => 20.0,
        PressKind::Review => 15.0,
        PressKind::Announcement => 10.0,
        PressKind::Other => 5.0,
    }
}

/// Item-level impact in `[0, 100]`, before any per-mention adjustment.
pub fn base_impact(item: &PressItem) -> f64 {
    (importance_points(item.importance) + market_points(item.market_impact) + kind_points(item.kind))
        .min(MAX_BASE_IMPACT)
}

pub fn polarity(sentiment: Sentiment) -> f64 {
    match sentiment {
        Sentiment::Positive => 1.0,
        Sentiment::Neutral => 0.0,
        Sentiment::Negative => -1.0,
        Sentiment::Mixed => 0.2,
    }
}

pub fn relevance_weight(relevance: Relevance) -> f64 {
    match relevance {
        Relevance::Primary => 1.0,
        Relevance::Secondary => 0.5,
        Relevance::Mentioned => 0.2,
    }
}

/// `0.5^(age / half_life)`; strictly decreasing in age.
pub fn age_decay(age_days: f64, half_life_days: f64) -> f64 {
    (-std::f64::consts::LN_2 * age_days / half_life_days).exp()
}

/// Fractional days between publication and reference time.
pub fn age_days(published_at: DateTime<Utc>, reference: DateTime<Utc>) -> f64 {
    (reference - published_at).num_seconds() as f64 / SECONDS_PER_DAY
}

/// Impact of one mention after all four stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MentionImpact {
    /// Volume contribution, never negative.
    pub weighted: f64,
    /// Sentiment contribution.
    pub signed: f64,
    pub age_days: f64,
}

/// `None` when the item is published after the reference time.
pub fn mention_impact(
    item: &PressItem,
    mention: &Mention,
    reference: DateTime<Utc>,
    cfg: &NewsConfig,
) -> Option<MentionImpact> {
    let age = age_days(item.published_at, reference);
    if age < 0.0 {
        return None;
    }
    let base = base_impact(item);
    let weighted = base * (1.0 + polarity(mention.sentiment) * relevance_weight(mention.relevance));
    let signed = weighted - base;

    let decay = age_decay(age, cfg.half_life_days);
    let discount = if item.is_promotional() { cfg.pr_discount } else { 1.0 };

    Some(MentionImpact {
        weighted: weighted * decay * discount,
        signed: signed * decay * discount,
        age_days: age,
    })
}

/// Press items visible at one reference time, indexed by mentioned entity.
///
/// Built once per run and shared read-only across scoring workers.
#[derive(Debug, Default)]
pub struct PressIndex<'a> {
    reference: Option<DateTime<Utc>>,
    by_entity: HashMap<&'a str, Vec<(&'a PressItem, &'a Mention)>>,
}

impl<'a> PressIndex<'a> {
    pub fn build(press: &'a [PressItem], reference: DateTime<Utc>) -> Self {
        let mut by_entity: HashMap<&'a str, Vec<(&'a PressItem, &'a Mention)>> = HashMap::new();
        for item in press.iter().filter(|p| p.published_at <= reference) {
            for mention in &item.mentions {
                by_entity
                    .entry(mention.entity_id.as_str())
                    .or_default()
                    .push((item, mention));
            }
        }
        Self {
            reference: Some(reference),
            by_entity,
        }
    }

    pub fn mentions(&self, entity_id: &str) -> &[(&'a PressItem, &'a Mention)] {
        self.by_entity
            .get(entity_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Aggregate impact for one entity.
    pub fn impact(&self, entity_id: &str, cfg: &NewsConfig) -> NewsImpact {
        let Some(reference) = self.reference else {
            return NewsImpact::default();
        };
        let mut out = NewsImpact::default();
        for (item, mention) in self.mentions(entity_id) {
            let Some(m) = mention_impact(item, mention, reference, cfg) else {
                continue;
            };
            out.total_impact += m.weighted;
            if m.signed > 0.0 {
                out.positive_impact += m.signed;
            } else if m.signed < 0.0 {
                out.negative_impact -= m.signed;
            }
            out.total_mentions += 1;
            if m.age_days <= cfg.recent_window_days {
                out.recent_mentions += 1;
            }
        }
        out.net_impact = out.positive_impact - out.negative_impact;
        out
    }

    /// Mentions counted toward adoption press buckets.
    pub fn adoption_press_count(&self, entity_id: &str, policy: AdoptionPressPolicy) -> u64 {
        self.mentions(entity_id)
            .iter()
            .filter(|(_, m)| policy.counts(m.relevance))
            .count() as u64
    }
}
