use std::path::PathBuf;

use clap::Parser;

use duel_bench::config::{DuelConfig, ScheduleOverlay};
use duel_bench::logging::start_telemetry;
use duel_bench::tournament::Tournament;

/// Seeded head-to-head runs between two duel agents.
#[derive(Debug, Parser)]
#[command(
    name = "duel-bench",
    author,
    version,
    about = "Replay seeded deals between a challenger and a baseline"
)]
struct Cli {
    /// YAML run description.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Number of deals to play.
    #[arg(long, value_name = "N")]
    deals: Option<usize>,

    /// Seed for the deal sequence.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Play each deal once, challenger North.
    #[arg(long)]
    no_swap: bool,

    /// Directory for the games file, summary and telemetry.
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Replace one stage of the challenger's search budget; repeatable.
    #[arg(long = "schedule", value_name = "STAGE=DEPTHxSAMPLES")]
    schedules: Vec<ScheduleOverlay>,

    /// Check the run description and exit.
    #[arg(long)]
    check: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = DuelConfig::load(&cli.config)?;

    if let Some(deals) = cli.deals {
        config.deals.count = deals;
    }
    if let Some(seed) = cli.seed {
        config.deals.seed = seed;
    }
    if cli.no_swap {
        config.deals.swap_seats = false;
    }
    if let Some(out_dir) = cli.out_dir {
        config.out_dir = out_dir;
    }
    for overlay in cli.schedules {
        config.apply_overlay(overlay)?;
    }
    config.check()?;

    println!(
        "{}: {} vs {}, {} deals x {} seatings, seed {}",
        config.name,
        config.challenger.name,
        config.baseline.name,
        config.deals.count,
        config.games_per_deal(),
        config.deals.seed
    );
    if cli.check {
        println!("Configuration is valid.");
        return Ok(());
    }

    let _telemetry = start_telemetry(&config)?;
    let finished = Tournament::new(config).run()?;

    for contender in &finished.report.contenders {
        println!(
            "  {:<12} {:>5.1}% won  [{:.1}%, {:.1}%]  {:.2} points/game",
            contender.name,
            contender.win_rate() * 100.0,
            contender.win_interval.0 * 100.0,
            contender.win_interval.1 * 100.0,
            contender.points_per_game
        );
    }
    let pairs = &finished.report.pairs;
    if finished.report.games > finished.report.deals {
        println!(
            "  paired deals: ahead {}, behind {}, level {} (sign test p = {:.4})",
            pairs.ahead, pairs.behind, pairs.level, pairs.sign_test_p
        );
    }
    println!("Games:   {}", finished.games_path.display());
    println!("Summary: {}", finished.summary_path.display());
    if let Some(telemetry) = finished.telemetry.as_ref() {
        println!(
            "Telemetry: {} engine decisions, summary at {}",
            telemetry.summary.decisions,
            telemetry.markdown_path.display()
        );
    }

    Ok(())
}
