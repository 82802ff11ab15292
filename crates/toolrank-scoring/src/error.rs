//! Engine errors.
//!
//! Only configuration problems are fatal. Bad evidence for one entity is
//! recovered locally and never surfaces here.

use toolrank_models::WeightError;
use toolrank_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no weight table for algorithm version {0}")]
    MissingWeightVersion(String),

    #[error("unknown algorithm version: {0}")]
    UnknownVersion(String),

    #[error("invalid weights for {version}: {source}")]
    InvalidWeights {
        version: String,
        #[source]
        source: WeightError,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("news half-life must be a positive number of days, got {0}")]
    InvalidHalfLife(f64),

    #[error("worker pool error: {0}")]
    WorkerPool(String),

    #[error("invalid period: {0}")]
    InvalidPeriod(String),
}
