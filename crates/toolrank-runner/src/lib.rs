//! # toolrank runner
//!
//! Command-line front end for the ranking engine.
//!
//! ## Commands
//! - `rank`: one snapshot for a period (live, or reconstructed with `--as-of`)
//! - `backtest`: one historical snapshot per month in a range
//! - `explain`: per-factor breakdown for one entity
//! - `versions`: algorithm versions and their default weights
//!
//! ## Exit Codes
//! - 0: success
//! - 2: error (bad arguments, unreadable data, digest mismatch, ...)

pub mod config;
pub mod observability;
pub mod snapshot_io;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use toolrank_models::{RankingSnapshot, WeightTable};
use toolrank_scoring::{
    AlgorithmVersion, BuiltinWeights, Engine, EngineConfig, Explanation, HistoricalReconstructor,
    MonthPeriod, RankRequest, end_of_day, resolve_weights,
};
use toolrank_store::{DirectoryStore, EvidenceStore, PressSource};

use crate::config::RankerConfig;
use crate::snapshot_io::SnapshotWriteResult;

/// toolrank: auditable rankings for AI coding tools.
#[derive(Parser, Debug)]
#[command(name = "toolrank")]
#[command(version)]
#[command(about = "Versioned, auditable rankings for AI coding tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./toolrank.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: text (default) or json
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank every entity for one period and write the snapshot
    Rank {
        /// Period label YYYY-MM (defaults to the current month)
        #[arg(long)]
        period: Option<String>,

        /// Algorithm version (v6.0, v7.0, v7.1, latest)
        #[arg(long)]
        version: Option<String>,

        /// Data directory (entities.jsonl, evidence.jsonl, press.jsonl, weights.toml)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Snapshot output directory
        #[arg(long)]
        out: Option<PathBuf>,

        /// Prior snapshot used for movement
        #[arg(long)]
        previous: Option<PathBuf>,

        /// Reconstruct as of this date (YYYY-MM-DD) instead of ranking live
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Reconstruct one snapshot per month in [from, to]
    Backtest {
        /// First month, YYYY-MM
        #[arg(long)]
        from: String,

        /// Last month, YYYY-MM
        #[arg(long)]
        to: String,

        #[arg(long)]
        version: Option<String>,

        #[arg(long)]
        data: Option<PathBuf>,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Per-factor breakdown for one entity
    Explain {
        /// Entity id
        #[arg(long, short = 'e')]
        entity: String,

        #[arg(long)]
        version: Option<String>,

        #[arg(long)]
        data: Option<PathBuf>,

        /// Use evidence recorded on or before this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// List algorithm versions and their default weights
    Versions,
}

/// Build the tokio runtime the runner drives its I/O on.
pub fn create_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")
}

/// Parse the command line and run it.
pub fn run() -> Result<()> {
    run_cli(Cli::parse())
}

pub fn run_cli(cli: Cli) -> Result<()> {
    let cfg = RankerConfig::resolve(cli.config.as_deref())?;
    let _guards = observability::init_tracing(&cfg.logging.service, &cfg.logging.dir);
    let rt = create_runtime()?;
    rt.block_on(async_main(cli, cfg))
}

async fn async_main(cli: Cli, cfg: RankerConfig) -> Result<()> {
    let format = cli.format;
    match cli.command {
        Commands::Rank {
            period,
            version,
            data,
            out,
            previous,
            as_of,
        } => {
            let settings = Settings::new(&cfg, version, data, out)?;
            let outcome = rank_period(&settings, period, previous, as_of).await?;
            print_rank(&outcome, format)?;
        }
        Commands::Backtest {
            from,
            to,
            version,
            data,
            out,
        } => {
            let settings = Settings::new(&cfg, version, data, out)?;
            let from: MonthPeriod = from.parse()?;
            let to: MonthPeriod = to.parse()?;
            let outcomes = backtest(&settings, from, to).await?;
            print_backtest(&outcomes, format)?;
        }
        Commands::Explain {
            entity,
            version,
            data,
            as_of,
        } => {
            let settings = Settings::new(&cfg, version, data, None)?;
            let explanation = explain(&settings, entity, as_of).await?;
            print_explanation(&explanation, format)?;
        }
        Commands::Versions => print_versions(format)?,
    }
    Ok(())
}

/// Effective settings after CLI flags override the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub version: AlgorithmVersion,
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub engine: EngineConfig,
}

impl Settings {
    pub fn new(
        cfg: &RankerConfig,
        version: Option<String>,
        data: Option<PathBuf>,
        out: Option<PathBuf>,
    ) -> Result<Self> {
        let version = match version {
            Some(v) => v
                .parse::<AlgorithmVersion>()
                .with_context(|| format!("Invalid --version '{}'", v))?,
            None => cfg.algorithm_version()?,
        };
        Ok(Self {
            version,
            data_dir: data.unwrap_or_else(|| cfg.data.dir.clone()),
            out_dir: out.unwrap_or_else(|| cfg.output.dir.clone()),
            engine: cfg.engine_config()?,
        })
    }
}

/// Open the data directory and build an engine for the chosen version.
///
/// Weights come from `weights.toml` in the data directory when it has the
/// version, else from the built-in table.
pub fn open_engine(settings: &Settings) -> Result<(DirectoryStore, Engine)> {
    let store = DirectoryStore::open(&settings.data_dir)
        .with_context(|| format!("Failed to open data directory {:?}", settings.data_dir))?;
    let weights: WeightTable = resolve_weights(&[&store, &BuiltinWeights], settings.version)
        .with_context(|| format!("No usable weights for {}", settings.version))?;
    let engine = Engine::new(settings.version, weights, settings.engine)
        .context("Failed to build ranking engine")?;
    Ok((store, engine))
}

/// A written snapshot.
#[derive(Debug, Clone)]
pub struct RankOutcome {
    pub snapshot: RankingSnapshot,
    pub written: SnapshotWriteResult,
}

/// Rank one period and persist the snapshot.
pub async fn rank_period(
    settings: &Settings,
    period: Option<String>,
    previous: Option<PathBuf>,
    as_of: Option<NaiveDate>,
) -> Result<RankOutcome> {
    let now = Utc::now();
    let month: MonthPeriod = match period {
        Some(p) => p.parse()?,
        None => MonthPeriod::of(as_of.unwrap_or_else(|| now.date_naive())),
    };
    match as_of {
        Some(date) if MonthPeriod::of(date) != month => {
            bail!("--as-of {} falls outside period {}", date, month);
        }
        None if month != MonthPeriod::of(now.date_naive()) => {
            warn!(
                period = %month,
                "live rank for a past or future period uses today's evidence; pass --as-of to reconstruct it"
            );
        }
        _ => {}
    }
    let previous = match previous {
        Some(path) => Some(snapshot_io::load_snapshot(&path).await?),
        None => None,
    };

    let settings_owned = settings.clone();
    let snapshot = tokio::task::spawn_blocking(move || -> Result<RankingSnapshot> {
        let (store, engine) = open_engine(&settings_owned)?;
        let period = month.to_string();
        let snapshot = match as_of {
            Some(date) => HistoricalReconstructor::new(&engine, &store, &store)
                .reconstruct_linked(&period, date, previous.as_ref())?,
            None => {
                let request = RankRequest::live(period, now).with_previous(previous.as_ref());
                engine.rank_current(&store, &store, &request)?
            }
        };
        Ok(snapshot)
    })
    .await
    .context("Ranking task panicked")??;

    let written = snapshot_io::write_snapshot(&settings.out_dir, &snapshot).await?;
    Ok(RankOutcome { snapshot, written })
}

/// Reconstruct and persist one snapshot per month.
pub async fn backtest(
    settings: &Settings,
    from: MonthPeriod,
    to: MonthPeriod,
) -> Result<Vec<RankOutcome>> {
    let settings_owned = settings.clone();
    let snapshots = tokio::task::spawn_blocking(move || -> Result<Vec<RankingSnapshot>> {
        let (store, engine) = open_engine(&settings_owned)?;
        Ok(HistoricalReconstructor::new(&engine, &store, &store).backtest_months(from, to)?)
    })
    .await
    .context("Backtest task panicked")??;

    let mut outcomes = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        let written = snapshot_io::write_snapshot(&settings.out_dir, &snapshot).await?;
        outcomes.push(RankOutcome { snapshot, written });
    }
    info!(
        snapshots = outcomes.len(),
        out_dir = %settings.out_dir.display(),
        "backtest snapshots written"
    );
    Ok(outcomes)
}

/// Explain one entity on current evidence, or as of a date.
pub async fn explain(
    settings: &Settings,
    entity_id: String,
    as_of: Option<NaiveDate>,
) -> Result<Explanation> {
    let settings_owned = settings.clone();
    let now = Utc::now();
    tokio::task::spawn_blocking(move || -> Result<Explanation> {
        let (store, engine) = open_engine(&settings_owned)?;
        let (entity, reference) = match as_of {
            Some(date) => {
                let reference = end_of_day(date);
                (store.evidence_as_of(&entity_id, reference)?, reference)
            }
            None => (store.evidence(&entity_id)?, now),
        };
        let entity = entity.ok_or_else(|| match as_of {
            Some(date) => anyhow!("No evidence for '{}' on or before {}", entity_id, date),
            None => anyhow!("Unknown entity '{}'", entity_id),
        })?;
        let press = store.press_items(None)?;
        Ok(engine.explain(&entity, &press, reference))
    })
    .await
    .context("Explain task panicked")?
}

// =============================================================================
// Output
// =============================================================================

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

fn print_rank(outcome: &RankOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&outcome.snapshot),
        OutputFormat::Text => {
            print!("{}", render_snapshot(&outcome.snapshot));
            println!("Written: {}", outcome.written.snapshot_path.display());
            Ok(())
        }
    }
}

fn print_backtest(outcomes: &[RankOutcome], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let snapshots: Vec<&RankingSnapshot> = outcomes.iter().map(|o| &o.snapshot).collect();
            print_json(&snapshots)
        }
        OutputFormat::Text => {
            println!("{:<8}  {:>6}  {:>8}  {:<24}  FILE", "PERIOD", "RANKED", "EXCLUDED", "LEADER");
            for outcome in outcomes {
                let s = &outcome.snapshot;
                let leader = s
                    .rankings
                    .first()
                    .map(|r| r.entity_name.as_str())
                    .unwrap_or("-");
                println!(
                    "{:<8}  {:>6}  {:>8}  {:<24}  {}",
                    s.period,
                    s.rankings.len(),
                    s.excluded.len(),
                    leader,
                    outcome.written.snapshot_path.display()
                );
            }
            Ok(())
        }
    }
}

fn print_explanation(explanation: &Explanation, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(explanation),
        OutputFormat::Text => {
            print!("{}", render_explanation(explanation));
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct VersionListing {
    version: AlgorithmVersion,
    max_score: f64,
    precision: f64,
    confidence_gate: bool,
    weights: WeightTable,
}

fn print_versions(format: OutputFormat) -> Result<()> {
    let listings: Vec<VersionListing> = AlgorithmVersion::ALL
        .iter()
        .map(|v| {
            let profile = v.profile();
            VersionListing {
                version: *v,
                max_score: profile.max_score,
                precision: profile.precision,
                confidence_gate: profile.apply_confidence,
                weights: v.default_weights(),
            }
        })
        .collect();
    match format {
        OutputFormat::Json => print_json(&listings),
        OutputFormat::Text => {
            for l in &listings {
                let latest = if l.version == AlgorithmVersion::LATEST {
                    " (latest)"
                } else {
                    ""
                };
                println!(
                    "{}{}: max {}, step {}, confidence gate {}",
                    l.version,
                    latest,
                    l.max_score,
                    l.precision,
                    if l.confidence_gate { "on" } else { "off" }
                );
                let w = &l.weights;
                println!(
                    "  capability {:.2}  innovation {:.2}  technical {:.2}  adoption {:.2}",
                    w.capability, w.innovation, w.technical_depth, w.adoption
                );
                println!(
                    "  market {:.2}  sentiment {:.2}  velocity {:.2}  resilience {:.2}",
                    w.market_traction, w.sentiment, w.velocity, w.resilience
                );
            }
            Ok(())
        }
    }
}

/// Plain-text ranking table.
pub fn render_snapshot(snapshot: &RankingSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} ({}) as of {}\n",
        snapshot.period,
        snapshot.algorithm_version,
        snapshot.kind,
        snapshot.reference_date.format("%Y-%m-%d")
    ));
    out.push_str(&format!(
        "{:>4}  {:<28}  {:>10}  {:>6}  {:>5}\n",
        "RANK", "TOOL", "SCORE", "CONF", "MOVE"
    ));
    for row in &snapshot.rankings {
        let movement = match row.movement {
            Some(m) if m > 0 => format!("+{}", m),
            Some(m) => m.to_string(),
            None => "new".to_string(),
        };
        let flag = if row.issues.is_empty() { "" } else { " !" };
        out.push_str(&format!(
            "{:>4}  {:<28}  {:>10.4}  {:>6.3}  {:>5}{}\n",
            row.rank, row.entity_name, row.score, row.confidence_multiplier, movement, flag
        ));
    }
    for ex in &snapshot.excluded {
        out.push_str(&format!("  excluded {}: {}\n", ex.entity_id, ex.reason));
    }
    out.push_str(&format!("digest {}\n", snapshot.digest));
    out
}

/// Plain-text factor breakdown.
pub fn render_explanation(e: &Explanation) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} ({}) under {} as of {}\n",
        e.entity_name,
        e.entity_id,
        e.algorithm_version,
        e.reference_date.format("%Y-%m-%d")
    ));
    out.push_str(&format!(
        "{:<16}  {:>8}  {:>6}  {:>8}\n",
        "FACTOR", "SCORE", "WEIGHT", "CONTRIB"
    ));
    for f in &e.factors {
        out.push_str(&format!(
            "{:<16}  {:>8.3}  {:>6.2}  {:>8.3}\n",
            f.dimension.as_str(),
            f.score,
            f.weight,
            f.contribution
        ));
    }
    out.push_str(&format!("weighted sum      {:.4} / {}\n", e.weighted_sum, e.max_score));
    out.push_str(&format!(
        "completeness      {:.0}  (confidence x{:.3})\n",
        e.completeness, e.confidence_multiplier
    ));
    if !e.missing_evidence.is_empty() {
        let missing: Vec<&str> = e.missing_evidence.iter().map(|m| m.as_str()).collect();
        out.push_str(&format!("missing evidence  {}\n", missing.join(", ")));
    }
    out.push_str(&format!("adjusted score    {:.4}\n", e.adjusted_score));
    if !e.news.is_empty() {
        out.push_str(&format!(
            "news              +{:.2} / -{:.2} over {} mentions ({} recent)\n",
            e.news.positive_impact,
            e.news.negative_impact,
            e.news.total_mentions,
            e.news.recent_mentions
        ));
    }
    for issue in &e.issues {
        out.push_str(&format!("issue             {}: {}\n", issue.field, issue.reason));
    }
    out
}
