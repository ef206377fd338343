//! Structured telemetry for a benchmark run.
//!
//! Engine decisions, policy plays and harness events are written as JSON lines to
//! `telemetry.jsonl` in the run's output directory. `RUST_LOG` overrides the configured filter.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use crate::config::{DuelConfig, TELEMETRY_FILE};

/// Flushes buffered events when dropped; hold it until the run is over.
pub struct TelemetryGuard {
    _flush: WorkerGuard,
    pub path: PathBuf,
}

/// Installs the JSON subscriber when telemetry is enabled for this run.
pub fn start_telemetry(config: &DuelConfig) -> Result<Option<TelemetryGuard>> {
    if !config.telemetry.enabled {
        return Ok(None);
    }

    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("creating {}", config.out_dir.display()))?;
    let path = config.telemetry_path();
    // the appender opens in append mode; a rerun must not count the previous run's events
    if path.exists() {
        fs::remove_file(&path).with_context(|| format!("clearing {}", path.display()))?;
    }

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(TELEMETRY_FILE)
        .build(&config.out_dir)
        .with_context(|| format!("opening {}", path.display()))?;
    let (writer, flush) = NonBlockingBuilder::default().lossy(false).finish(appender);

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.telemetry.filter)
            .with_context(|| format!("telemetry filter '{}'", config.telemetry.filter))?,
    };

    let installed = tracing_subscriber::fmt()
        .json()
        .with_current_span(false)
        .with_env_filter(filter)
        .with_writer(writer)
        .try_init()
        .is_ok();
    if installed {
        tracing::info!(
            target: "duel_bench::run",
            run = %config.name,
            deals = config.deals.count,
            games_per_deal = config.games_per_deal(),
            "telemetry started"
        );
    }

    Ok(Some(TelemetryGuard {
        _flush: flush,
        path,
    }))
}
