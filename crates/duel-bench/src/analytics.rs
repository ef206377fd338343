//! Head-to-head statistics for a finished run.
//!
//! Results are split by the seat each contender held, since North always leads the first round.
//! When seats are swapped every deal is played twice, and the two games together form one paired
//! comparison: the challenger is ahead, behind or level on that deal. A two-sided sign test over
//! those pairs says whether the challenger's edge is more than luck of the deal.

use std::collections::BTreeMap;

use duel_bot::config::{Stage, StageBands};
use duel_core::model::seat::Seat;
use serde::Serialize;
use statrs::distribution::{Binomial, ContinuousCDF, DiscreteCDF, Normal};

use crate::tournament::{BASELINE, CHALLENGER, GameRecord};

const CONFIDENCE: f64 = 0.95;

/// Running totals, fed one game at a time.
pub struct Scoreboard {
    names: [String; 2],
    bands: StageBands,
    tallies: [Tally; 2],
    latency: [[Latency; 3]; 2],
    /// Challenger points minus baseline points, summed over the games of each deal.
    margins: BTreeMap<usize, i64>,
    games: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    wins: [u32; 2],
    draws: [u32; 2],
    games: [u32; 2],
    points: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Latency {
    decisions: u64,
    total_ms: f64,
    slowest_ms: f64,
}

impl Scoreboard {
    pub fn new(challenger: &str, baseline: &str, bands: StageBands) -> Self {
        Self {
            names: [challenger.to_string(), baseline.to_string()],
            bands,
            tallies: [Tally::default(); 2],
            latency: [[Latency::default(); 3]; 2],
            margins: BTreeMap::new(),
            games: 0,
        }
    }

    pub fn record(&mut self, game: &GameRecord) {
        self.games += 1;
        for contender in [CHALLENGER, BASELINE] {
            let seat = game.seat_of(contender).index();
            let own = game.points[contender];
            let other = game.points[1 - contender];
            let tally = &mut self.tallies[contender];
            tally.games[seat] += 1;
            tally.points += u64::from(own);
            if own > other {
                tally.wins[seat] += 1;
            } else if own == other {
                tally.draws[seat] += 1;
            }
        }

        *self.margins.entry(game.deal).or_default() +=
            i64::from(game.points[CHALLENGER]) - i64::from(game.points[BASELINE]);

        for timing in &game.timings {
            let stage = self.bands.stage_for(timing.rounds_remaining);
            let slot = &mut self.latency[timing.contender][stage_slot(stage)];
            slot.decisions += 1;
            slot.total_ms += timing.millis;
            slot.slowest_ms = slot.slowest_ms.max(timing.millis);
        }
    }

    pub fn finish(self, latency_budget_ms: f64) -> DuelReport {
        let contenders = [CHALLENGER, BASELINE]
            .map(|contender| self.contender_report(contender, latency_budget_ms))
            .to_vec();

        let mut pairs = PairReport::default();
        for margin in self.margins.values() {
            match margin.signum() {
                1 => pairs.ahead += 1,
                -1 => pairs.behind += 1,
                _ => pairs.level += 1,
            }
        }
        pairs.sign_test_p = sign_test(pairs.ahead, pairs.behind);

        DuelReport {
            games: self.games,
            deals: self.margins.len(),
            contenders,
            pairs,
            latency_budget_ms,
        }
    }

    fn contender_report(&self, contender: usize, budget_ms: f64) -> ContenderReport {
        let tally = &self.tallies[contender];
        let games: u32 = tally.games.iter().sum();
        let wins: u32 = tally.wins.iter().sum();
        let draws: u32 = tally.draws.iter().sum();

        let stages: Vec<StageLatency> = Stage::ORDER
            .into_iter()
            .map(|stage| {
                let slot = self.latency[contender][stage_slot(stage)];
                StageLatency {
                    stage,
                    decisions: slot.decisions,
                    mean_ms: (slot.decisions > 0).then(|| slot.total_ms / slot.decisions as f64),
                    slowest_ms: slot.slowest_ms,
                }
            })
            .collect();
        let within_budget = stages
            .iter()
            .filter_map(|stage| stage.mean_ms)
            .all(|mean| mean <= budget_ms);

        ContenderReport {
            name: self.names[contender].clone(),
            games,
            wins,
            draws,
            losses: games - wins - draws,
            points_per_game: if games == 0 {
                0.0
            } else {
                tally.points as f64 / f64::from(games)
            },
            win_interval: wilson_interval(wins, games),
            leading: SeatRecord::new(tally, Seat::North),
            following: SeatRecord::new(tally, Seat::South),
            stages,
            within_budget,
        }
    }
}

fn stage_slot(stage: Stage) -> usize {
    match stage {
        Stage::Early => 0,
        Stage::Midgame => 1,
        Stage::Endgame => 2,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DuelReport {
    pub games: usize,
    pub deals: usize,
    /// Challenger first.
    pub contenders: Vec<ContenderReport>,
    pub pairs: PairReport,
    pub latency_budget_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContenderReport {
    pub name: String,
    pub games: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points_per_game: f64,
    pub win_interval: (f64, f64),
    /// Games where this contender led round one.
    pub leading: SeatRecord,
    pub following: SeatRecord,
    pub stages: Vec<StageLatency>,
    pub within_budget: bool,
}

impl ContenderReport {
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.games)
        }
    }

    pub fn slowest_ms(&self) -> f64 {
        self.stages
            .iter()
            .map(|stage| stage.slowest_ms)
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeatRecord {
    pub games: u32,
    pub wins: u32,
}

impl SeatRecord {
    fn new(tally: &Tally, seat: Seat) -> Self {
        Self {
            games: tally.games[seat.index()],
            wins: tally.wins[seat.index()],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StageLatency {
    pub stage: Stage,
    pub decisions: u64,
    pub mean_ms: Option<f64>,
    pub slowest_ms: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PairReport {
    pub ahead: u64,
    pub behind: u64,
    pub level: u64,
    pub sign_test_p: f64,
}

impl DuelReport {
    pub fn render_markdown(&self, run_name: &str) -> String {
        let mut out = format!("# Duel: {run_name}\n\n");
        if let [challenger, baseline] = self.contenders.as_slice() {
            out.push_str(&format!(
                "`{}` (challenger) against `{}` (baseline): {} deals, {} games.\n\n",
                challenger.name, baseline.name, self.deals, self.games
            ));
        }

        out.push_str("| Contender | Games | Won | Drawn | Lost | Win rate | 95% interval | Points/game | Won leading | Won following |\n");
        out.push_str("|---|---|---|---|---|---|---|---|---|---|\n");
        for report in &self.contenders {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {:.1}% | [{:.1}%, {:.1}%] | {:.2} | {}/{} | {}/{} |\n",
                report.name,
                report.games,
                report.wins,
                report.draws,
                report.losses,
                report.win_rate() * 100.0,
                report.win_interval.0 * 100.0,
                report.win_interval.1 * 100.0,
                report.points_per_game,
                report.leading.wins,
                report.leading.games,
                report.following.wins,
                report.following.games,
            ));
        }

        out.push_str("\n## Paired deals\n\n");
        if self.games > self.deals {
            out.push_str(&format!(
                "Every deal was played from both seats. Summed over each pair, the challenger was \
                 ahead on {} deals, behind on {} and level on {}. Sign test p = {:.4}.\n",
                self.pairs.ahead, self.pairs.behind, self.pairs.level, self.pairs.sign_test_p
            ));
        } else {
            out.push_str("Seats were not swapped, so deals are not paired.\n");
        }

        out.push_str("\n## Decision time by stage\n\n");
        out.push_str(&format!(
            "Mean milliseconds per decision; budget {:.0} ms in every stage.\n\n",
            self.latency_budget_ms
        ));
        out.push_str("| Contender |");
        for stage in Stage::ORDER {
            out.push_str(&format!(" {stage} |"));
        }
        out.push_str(" Slowest | Within budget |\n|---|---|---|---|---|---|\n");
        for report in &self.contenders {
            out.push_str(&format!("| {} |", report.name));
            for stage in &report.stages {
                match stage.mean_ms {
                    Some(mean) => out.push_str(&format!(" {mean:.2} |")),
                    None => out.push_str(" - |"),
                }
            }
            out.push_str(&format!(
                " {:.2} | {} |\n",
                report.slowest_ms(),
                if report.within_budget { "yes" } else { "no" }
            ));
        }
        out
    }
}

/// Wilson score interval for a win rate.
fn wilson_interval(wins: u32, games: u32) -> (f64, f64) {
    if games == 0 {
        return (0.0, 0.0);
    }
    let z = Normal::new(0.0, 1.0)
        .map(|normal| normal.inverse_cdf(0.5 + CONFIDENCE / 2.0))
        .unwrap_or(1.96);
    let n = f64::from(games);
    let rate = f64::from(wins) / n;
    let z2 = z * z;
    let denominator = 1.0 + z2 / n;
    let centre = (rate + z2 / (2.0 * n)) / denominator;
    let half = z * (rate * (1.0 - rate) / n + z2 / (4.0 * n * n)).sqrt() / denominator;
    ((centre - half).max(0.0), (centre + half).min(1.0))
}

/// Two-sided exact sign test; level pairs carry no information and are left out.
fn sign_test(ahead: u64, behind: u64) -> f64 {
    let n = ahead + behind;
    if n == 0 {
        return 1.0;
    }
    Binomial::new(0.5, n)
        .map(|binomial| 2.0 * binomial.cdf(ahead.min(behind)))
        .unwrap_or(1.0)
        .min(1.0)
}
