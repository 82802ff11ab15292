//! # toolrank scoring
//!
//! Deterministic composite ranking of AI coding tools from heterogeneous,
//! incomplete evidence.
//!
//! ## Components
//! - `normalize`: ordered fallback paths resolved into typed evidence
//! - `news_impact`: decayed, PR-discounted press impact
//! - `factors`: eight pure factor scorers
//! - `completeness`: evidence checklist and confidence multiplier
//! - `tiebreak`: sub-step nudge that makes every final score unique
//! - `versions`: algorithm versions, strategies and canonical weights
//! - `engine`: the versioned aggregator and ranker
//! - `historical`: as-of reconstruction and monthly backtests
//!
//! ## Determinism Contract
//! Scores are a pure function of (evidence, press, reference time, version,
//! weights). No wall-clock reads happen inside the engine; live runs take
//! their reference time from the caller.

pub mod completeness;
pub mod engine;
pub mod error;
pub mod factors;
pub mod historical;
pub mod news_impact;
pub mod normalize;
pub mod tiebreak;
pub mod versions;

pub use completeness::{ChecklistItem, completeness, confidence_multiplier};
pub use engine::{Engine, EngineConfig, Explanation, FactorContribution, RankRequest, ScoredEntity};
pub use error::EngineError;
pub use historical::{HistoricalReconstructor, MonthPeriod, end_of_day};
pub use news_impact::{NewsConfig, PressIndex};
pub use normalize::{NormalizedEvidence, PricingTier};
pub use versions::{
    AdoptionPressPolicy, AlgorithmVersion, BuiltinWeights, NewsStrategy, VersionProfile,
    resolve_weights,
};
