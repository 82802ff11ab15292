//! # Configuration Loading
//!
//! `toolrank.toml` schema. Every section and key is optional; command-line
//! flags override what the file says.
//!
//! ```toml
//! [data]
//! dir = "data"
//!
//! [output]
//! dir = "snapshots"
//!
//! [engine]
//! version = "v7.1"
//! workers = 0          # 0 = half the cores
//! half_life_days = 90.0
//!
//! [logging]
//! service = "toolrank"
//! dir = "logs"
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use toolrank_scoring::news_impact::DEFAULT_HALF_LIFE_DAYS;
use toolrank_scoring::{AlgorithmVersion, EngineConfig};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "toolrank.toml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    pub data: DataSection,
    pub output: OutputSection,
    pub engine: EngineSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    pub dir: PathBuf,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("snapshots"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub version: String,
    pub workers: usize,
    pub half_life_days: f64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            version: AlgorithmVersion::LATEST.to_string(),
            workers: 0,
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub service: String,
    pub dir: PathBuf,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            service: "toolrank".to_string(),
            dir: PathBuf::from("logs"),
        }
    }
}

impl RankerConfig {
    /// Load configuration from file path.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Explicit path if given, else `toolrank.toml` if present, else defaults.
    pub fn resolve(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn algorithm_version(&self) -> anyhow::Result<AlgorithmVersion> {
        self.engine
            .version
            .parse::<AlgorithmVersion>()
            .with_context(|| format!("Invalid [engine] version '{}'", self.engine.version))
    }

    pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        if !(self.engine.half_life_days.is_finite() && self.engine.half_life_days > 0.0) {
            anyhow::bail!(
                "[engine] half_life_days must be positive, got {}",
                self.engine.half_life_days
            );
        }
        Ok(EngineConfig {
            workers: self.engine.workers,
            half_life_days: self.engine.half_life_days,
        })
    }
}
