//! Benchmark run description.
//!
//! A run pits a challenger against a baseline over a fixed number of seeded deals. Search
//! contenders carry their own [`EngineConfig`]; any part left out of the YAML keeps the engine
//! defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use duel_bot::config::{self as engine_config, EngineConfig, SearchBudget, Stage, StageBands};
use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const GAMES_FILE: &str = "games.jsonl";
pub const SUMMARY_FILE: &str = "summary.md";
pub const TELEMETRY_FILE: &str = "telemetry.jsonl";

const DEFAULT_DEAL_SEED: u64 = 0x5EED;
const DEFAULT_LATENCY_BUDGET_MS: f64 = 250.0;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DuelConfig {
    /// Label used in the summary title and in telemetry events.
    pub name: String,
    /// Directory receiving the games file, the summary and telemetry.
    pub out_dir: PathBuf,
    pub deals: Deals,
    pub challenger: Contender,
    pub baseline: Contender,
    /// Mean time per decision a contender may spend in any stage (default: 250 ms)
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: f64,
    #[serde(default)]
    pub telemetry: Telemetry,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Deals {
    #[serde(default = "default_deal_seed")]
    pub seed: u64,
    pub count: usize,
    /// Replay every deal with the contenders' seats exchanged (default: true)
    #[serde(default = "default_swap_seats")]
    pub swap_seats: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Contender {
    pub name: String,
    #[serde(flatten)]
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    Search {
        #[serde(default)]
        engine: EngineConfig,
    },
    Greedy,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Search { .. } => "search",
            Strategy::Greedy => "greedy",
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Telemetry {
    #[serde(default)]
    pub enabled: bool,
    /// `EnvFilter` directives, used when `RUST_LOG` is unset (default: "info")
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            enabled: false,
            filter: default_filter(),
        }
    }
}

fn default_deal_seed() -> u64 {
    DEFAULT_DEAL_SEED
}

fn default_swap_seats() -> bool {
    true
}

fn default_latency_budget_ms() -> f64 {
    DEFAULT_LATENCY_BUDGET_MS
}

fn default_filter() -> String {
    "info".to_string()
}

impl DuelConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: DuelConfig =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.check()?;
        Ok(config)
    }

    /// Rejects runs that could not produce a meaningful comparison.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::BlankName);
        }
        if self.deals.count == 0 {
            return Err(ConfigError::NoDeals);
        }
        for contender in self.contenders() {
            if contender.name.trim().is_empty() {
                return Err(ConfigError::BlankContender);
            }
            if let Strategy::Search { engine } = &contender.strategy {
                engine.validate().map_err(|source| ConfigError::Engine {
                    name: contender.name.clone(),
                    source,
                })?;
            }
        }
        if self.challenger.name == self.baseline.name {
            return Err(ConfigError::SameName(self.challenger.name.clone()));
        }
        if !(self.latency_budget_ms.is_finite() && self.latency_budget_ms > 0.0) {
            return Err(ConfigError::LatencyBudget(self.latency_budget_ms));
        }
        EnvFilter::try_new(&self.telemetry.filter).map_err(|err| ConfigError::Filter {
            filter: self.telemetry.filter.clone(),
            message: err.to_string(),
        })?;
        Ok(())
    }

    /// Challenger first.
    pub fn contenders(&self) -> [&Contender; 2] {
        [&self.challenger, &self.baseline]
    }

    /// Stage bands used to label decision timings: the first search contender's, else defaults.
    pub fn stage_bands(&self) -> StageBands {
        self.contenders()
            .into_iter()
            .find_map(|contender| match &contender.strategy {
                Strategy::Search { engine } => Some(engine.bands),
                Strategy::Greedy => None,
            })
            .unwrap_or_default()
    }

    /// Seat orders played per deal.
    pub fn games_per_deal(&self) -> usize {
        if self.deals.swap_seats { 2 } else { 1 }
    }

    /// Replaces one stage of the challenger's search budget.
    pub fn apply_overlay(&mut self, overlay: ScheduleOverlay) -> Result<(), ConfigError> {
        let Strategy::Search { engine } = &mut self.challenger.strategy else {
            return Err(ConfigError::OverlayOnGreedy(self.challenger.name.clone()));
        };
        let slot = match overlay.stage {
            Stage::Early => &mut engine.schedule.early,
            Stage::Midgame => &mut engine.schedule.midgame,
            Stage::Endgame => &mut engine.schedule.endgame,
        };
        *slot = overlay.budget;
        Ok(())
    }

    pub fn games_path(&self) -> PathBuf {
        self.out_dir.join(GAMES_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.out_dir.join(SUMMARY_FILE)
    }

    pub fn telemetry_path(&self) -> PathBuf {
        self.out_dir.join(TELEMETRY_FILE)
    }
}

/// `STAGE=DEPTHxSAMPLES`, for example `endgame=6x9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOverlay {
    pub stage: Stage,
    pub budget: SearchBudget,
}

impl FromStr for ScheduleOverlay {
    type Err = OverlayError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let malformed = || OverlayError::Malformed(text.to_string());
        let (stage, budget) = text.split_once('=').ok_or_else(malformed)?;
        let stage = Stage::ORDER
            .into_iter()
            .find(|candidate| candidate.as_str() == stage.trim())
            .ok_or_else(|| OverlayError::UnknownStage(stage.trim().to_string()))?;
        let (depth, samples) = budget.split_once('x').ok_or_else(malformed)?;
        let depth = depth.trim().parse().map_err(|_| malformed())?;
        let samples = samples.trim().parse().map_err(|_| malformed())?;
        Ok(Self {
            stage,
            budget: SearchBudget { depth, samples },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    #[error("'{0}' is not STAGE=DEPTHxSAMPLES")]
    Malformed(String),
    #[error("unknown stage '{0}', expected early, midgame or endgame")]
    UnknownStage(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("run name must not be blank")]
    BlankName,
    #[error("a run needs at least one deal")]
    NoDeals,
    #[error("contender names must not be blank")]
    BlankContender,
    #[error("challenger and baseline are both called '{0}'")]
    SameName(String),
    #[error("engine settings for '{name}': {source}")]
    Engine {
        name: String,
        #[source]
        source: engine_config::ConfigError,
    },
    #[error("latency budget must be a positive number of milliseconds, got {0}")]
    LatencyBudget(f64),
    #[error("telemetry filter '{filter}': {message}")]
    Filter { filter: String, message: String },
    #[error("schedule overlays need a search challenger, but '{0}' is greedy")]
    OverlayOnGreedy(String),
}
