//! # Logging
//!
//! ## Logging Architecture
//! - **stdout**: WARN only, regardless of `RUST_LOG`
//! - **file**: INFO for toolrank crates, WARN for deps (daily rotation);
//!   honors `RUST_LOG`

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default file filter when `RUST_LOG` is unset.
pub const DEFAULT_FILE_FILTER: &str = "toolrank=info,warn";

/// Guards that must be held for the lifetime of the process.
/// Dropping this will cause buffered logs to be lost.
pub struct TracingGuards {
    _file_guard: WorkerGuard,
}

/// Initializes tracing with bounded stdout + rotated file logs.
///
/// Writes to `<log_dir>/<service>.log.<date>`. A second call in the same
/// process keeps the first subscriber.
pub fn init_tracing(service: &str, log_dir: &Path) -> TracingGuards {
    if !log_dir.exists() {
        // Best effort: stdout logging still works without the directory.
        let _ = fs::create_dir_all(log_dir);
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, format!("{}.log", service));
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let stdout_filter = EnvFilter::new("warn");
    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILE_FILTER));

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(true)
        .compact()
        .with_filter(stdout_filter);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_filter(file_filter);

    let installed = tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            service,
            log_dir = %log_dir.display(),
            "logging initialized (stdout=WARN)"
        );
    }

    TracingGuards {
        _file_guard: file_guard,
    }
}
