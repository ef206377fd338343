//! Plays the configured deals between the challenger and the baseline.
//!
//! Every deal seed comes from one `StdRng`, so a run is reproducible from its config alone. With
//! seat swapping on, each deal is replayed with the contenders exchanged. North leads round one
//! in both games.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use duel_bot::engine::{Engine, EngineError};
use duel_bot::policy::{GreedyPolicy, Policy, PolicyContext, PolicyError, SearchPolicy};
use duel_core::game::match_state::{MatchState, PlayError};
use duel_core::game::state::StateError;
use duel_core::model::seat::Seat;
use duel_core::model::trick::RoundRecord;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{DuelReport, Scoreboard};
use crate::config::{Contender, DuelConfig, Strategy};
use crate::telemetry::{
    TelemetryError, TelemetryOutputs, append_highlights_to_markdown, write_summary_outputs,
};

/// Index of the challenger in per-contender arrays.
pub const CHALLENGER: usize = 0;
/// Index of the baseline in per-contender arrays.
pub const BASELINE: usize = 1;

pub struct Tournament {
    config: DuelConfig,
}

/// Where a finished run left its results.
pub struct TournamentReport {
    pub report: DuelReport,
    pub games_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry: Option<TelemetryOutputs>,
}

/// One game as seen by the analytics: who sat where, the points and every decision's cost.
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub deal: usize,
    pub deal_seed: u64,
    pub challenger_seat: Seat,
    /// Indexed by contender.
    pub points: [u32; 2],
    pub rounds: Vec<RoundRecord>,
    pub timings: Vec<DecisionTiming>,
}

impl GameRecord {
    pub fn seat_of(&self, contender: usize) -> Seat {
        if contender == CHALLENGER {
            self.challenger_seat
        } else {
            self.challenger_seat.opponent()
        }
    }

    fn contender_at(&self, seat: Seat) -> usize {
        if seat == self.challenger_seat {
            CHALLENGER
        } else {
            BASELINE
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionTiming {
    pub contender: usize,
    pub rounds_remaining: usize,
    pub millis: f64,
}

#[derive(Serialize)]
struct GameRow<'a> {
    run: &'a str,
    deal: usize,
    deal_seed: u64,
    north: &'a str,
    south: &'a str,
    north_points: u32,
    south_points: u32,
    winner: Option<&'a str>,
    rounds: &'a [RoundRecord],
    /// Wall-clock time per contender; the only field that differs between identical runs.
    decision_ms: BTreeMap<&'a str, f64>,
}

#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("engine for '{name}' rejected its settings: {source}")]
    Engine {
        name: String,
        #[source]
        source: EngineError,
    },
    #[error("'{name}' failed to choose a card: {source}")]
    Policy {
        name: String,
        #[source]
        source: PolicyError,
    },
    #[error("'{name}' made an illegal play: {source}")]
    Play {
        name: String,
        #[source]
        source: PlayError,
    },
    #[error("could not build the player view: {0}")]
    View(#[from] StateError),
    #[error("deal {deal} stopped before all rounds were played")]
    Unfinished { deal: usize },
    #[error("writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("encoding a game row: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

fn write_error(path: &Path) -> impl FnOnce(std::io::Error) -> TournamentError {
    let path = path.to_path_buf();
    move |source| TournamentError::Io { path, source }
}

impl Tournament {
    pub fn new(config: DuelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DuelConfig {
        &self.config
    }

    pub fn run(&self) -> Result<TournamentReport, TournamentError> {
        let config = &self.config;
        fs::create_dir_all(&config.out_dir).map_err(write_error(&config.out_dir))?;
        let games_path = config.games_path();
        let file = File::create(&games_path).map_err(write_error(&games_path))?;
        let mut rows = BufWriter::new(file);

        let mut seeds = StdRng::seed_from_u64(config.deals.seed);
        let mut scoreboard = Scoreboard::new(
            &config.challenger.name,
            &config.baseline.name,
            config.stage_bands(),
        );

        for deal in 0..config.deals.count {
            let deal_seed = seeds.next_u64();
            for &challenger_seat in self.seatings() {
                let game = self.play(deal, deal_seed, challenger_seat)?;
                let line = self.row_json(&game)?;
                rows.write_all(&line)
                    .and_then(|()| rows.write_all(b"\n"))
                    .map_err(write_error(&games_path))?;
                scoreboard.record(&game);
            }
        }
        rows.flush().map_err(write_error(&games_path))?;

        let report = scoreboard.finish(config.latency_budget_ms);
        let summary_path = config.summary_path();
        fs::write(&summary_path, report.render_markdown(&config.name))
            .map_err(write_error(&summary_path))?;

        let telemetry = if config.telemetry.enabled {
            write_summary_outputs(&config.telemetry_path(), &config.out_dir)?
        } else {
            None
        };
        if let Some(outputs) = telemetry.as_ref() {
            append_highlights_to_markdown(&summary_path, outputs)?;
        }

        Ok(TournamentReport {
            report,
            games_path,
            summary_path,
            telemetry,
        })
    }

    fn seatings(&self) -> &'static [Seat] {
        if self.config.deals.swap_seats {
            &[Seat::North, Seat::South]
        } else {
            &[Seat::North]
        }
    }

    /// Plays one deal with the challenger in `challenger_seat`.
    pub fn play(
        &self,
        deal: usize,
        deal_seed: u64,
        challenger_seat: Seat,
    ) -> Result<GameRecord, TournamentError> {
        let contenders = self.config.contenders();
        // seeded per contender, so swapping seats leaves each random stream unchanged
        let mut policies = [
            spawn_policy(contenders[CHALLENGER], deal_seed.wrapping_add(1))?,
            spawn_policy(contenders[BASELINE], deal_seed.wrapping_add(2))?,
        ];
        let mut game = GameRecord {
            deal,
            deal_seed,
            challenger_seat,
            points: [0; 2],
            rounds: Vec::new(),
            timings: Vec::new(),
        };

        let mut state = MatchState::with_seed(Seat::North, deal_seed);
        while let Some(seat) = state.expected_to_play() {
            let contender = game.contender_at(seat);
            let name = &contenders[contender].name;
            let view = state.view_for(seat)?;

            let started = Instant::now();
            let card = policies[contender]
                .choose_play(&PolicyContext { seat, state: &view })
                .map_err(|source| TournamentError::Policy {
                    name: name.clone(),
                    source,
                })?;
            let millis = started.elapsed().as_secs_f64() * 1000.0;
            game.timings.push(DecisionTiming {
                contender,
                rounds_remaining: view.rounds_remaining(),
                millis,
            });

            if tracing::enabled!(Level::INFO) {
                event!(
                    target: "duel_bench::play",
                    Level::INFO,
                    run = %self.config.name,
                    deal,
                    seat = seat.as_str(),
                    contender = %name,
                    round = state.round_number(),
                    card = card.value(),
                    millis,
                );
            }

            state
                .play_card(seat, card)
                .map_err(|source| TournamentError::Play {
                    name: name.clone(),
                    source,
                })?;
        }

        if !state.is_complete() {
            return Err(TournamentError::Unfinished { deal });
        }
        let scores = state.scores();
        game.points = [
            scores.score(challenger_seat),
            scores.score(challenger_seat.opponent()),
        ];
        game.rounds = state.history().iter().copied().collect();
        Ok(game)
    }

    fn row_json(&self, game: &GameRecord) -> Result<Vec<u8>, TournamentError> {
        let contenders = self.config.contenders();
        let name_at = |seat: Seat| contenders[game.contender_at(seat)].name.as_str();
        let points_at = |seat: Seat| game.points[game.contender_at(seat)];

        let mut decision_ms = BTreeMap::new();
        for timing in &game.timings {
            *decision_ms
                .entry(contenders[timing.contender].name.as_str())
                .or_insert(0.0) += timing.millis;
        }

        let north_points = points_at(Seat::North);
        let south_points = points_at(Seat::South);
        let winner = match north_points.cmp(&south_points) {
            std::cmp::Ordering::Greater => Some(name_at(Seat::North)),
            std::cmp::Ordering::Less => Some(name_at(Seat::South)),
            std::cmp::Ordering::Equal => None,
        };

        let row = GameRow {
            run: &self.config.name,
            deal: game.deal,
            deal_seed: game.deal_seed,
            north: name_at(Seat::North),
            south: name_at(Seat::South),
            north_points,
            south_points,
            winner,
            rounds: &game.rounds,
            decision_ms,
        };
        Ok(serde_json::to_vec(&row)?)
    }
}

fn spawn_policy(contender: &Contender, seed: u64) -> Result<Box<dyn Policy>, TournamentError> {
    match &contender.strategy {
        Strategy::Search { engine } => {
            let engine = Engine::new(*engine).map_err(|source| TournamentError::Engine {
                name: contender.name.clone(),
                source,
            })?;
            Ok(Box::new(SearchPolicy::new(engine, seed)))
        }
        Strategy::Greedy => Ok(Box::new(GreedyPolicy::new())),
    }
}
