use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use duel_app::controller::GameController;
use duel_app::input::{Command, parse_command};
use duel_bot::config::EngineConfig;
use duel_bot::engine::{Decision, Engine};
use duel_bot::policy::{GreedyPolicy, Policy, PolicyContext};
use duel_core::AppInfo;
use duel_core::model::card::Card;
use duel_core::model::trick::RoundRecord;
use tracing_subscriber::EnvFilter;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];
const SPINNER_TICK: Duration = Duration::from_millis(80);

/// Ten rounds, thirty cards, one engine across the table.
#[derive(Debug, Parser)]
#[command(
    name = "duel",
    author,
    version,
    about = "Play a ten-round card duel against the search engine"
)]
struct Cli {
    /// Seed for the deal; random when omitted.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Let the engine lead the first round.
    #[arg(long)]
    engine_leads: bool,

    /// Print the engine's best candidates after each of its plays.
    #[arg(long)]
    explain: bool,

    /// Number of candidates shown with --explain.
    #[arg(long, value_name = "N", default_value_t = 3)]
    top: usize,

    /// Play your seat with the greedy baseline instead of reading input.
    #[arg(long)]
    auto: bool,

    /// Write the match as JSON when it ends.
    #[arg(long, value_name = "FILE")]
    transcript: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let engine = Engine::new(EngineConfig::default())?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut controller = GameController::new(seed, !cli.engine_leads, engine);
    let mut autopilot = cli.auto.then(GreedyPolicy::new);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(
        out,
        "{} {} ({}), seed {seed}. Highest card takes the round.",
        AppInfo::name(),
        AppInfo::version(),
        AppInfo::codename()
    )?;

    while let Some(seat) = controller.expected_to_play() {
        if seat == controller.human() {
            writeln!(out, "{}", controller.status_text())?;
            let card = match autopilot.as_mut() {
                Some(policy) => {
                    let view = controller.view_for(seat)?;
                    policy.choose_play(&PolicyContext { seat, state: &view })?
                }
                None => match prompt_card(&mut input, &mut out, &controller)? {
                    Some(card) => card,
                    None => {
                        writeln!(out, "Quit. {}", controller.status_text())?;
                        write_transcript(&cli, &controller)?;
                        return Ok(());
                    }
                },
            };
            writeln!(out, "You play {card}.")?;
            controller.play(seat, card)?;
        } else {
            let decision = think(&controller)?;
            writeln!(out, "Engine plays {}.", decision.card)?;
            if cli.explain {
                explain(&mut out, &decision, controller.led_card(), cli.top)?;
            }
            controller.apply_decision(&decision)?;
        }

        if let Some(record) = controller.take_last_round() {
            print_round(&mut out, &controller, &record)?;
        }
    }

    let human = controller.scores().score(controller.human());
    let engine = controller.scores().score(controller.engine_seat());
    let verdict = match controller.result().map(|result| controller.result_label(result)) {
        Some("human") => "You win!",
        Some("engine") => "The engine wins.",
        _ => "It's a draw.",
    };
    writeln!(out, "Final score: you {human}, engine {engine}. {verdict}")?;
    write_transcript(&cli, &controller)?;
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // stdout belongs to the game, logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Reads lines until a playable card is entered. `None` means the player quit.
fn prompt_card(
    input: &mut impl BufRead,
    out: &mut impl Write,
    controller: &GameController,
) -> anyhow::Result<Option<Card>> {
    let hand = controller.hand(controller.human());
    loop {
        match controller.led_card() {
            Some(led) => writeln!(out, "Engine led {led}. Your hand: {hand}")?,
            None => writeln!(out, "You lead. Your hand: {hand}")?,
        }
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match parse_command(&line, hand) {
            Ok(Command::Play(card)) => return Ok(Some(card)),
            Ok(Command::Quit) => return Ok(None),
            Ok(Command::Hand) => {}
            Ok(Command::Help) => writeln!(
                out,
                "Enter the number of a card in your hand. The higher card wins the round and \
                 the winner leads next. `q` quits."
            )?,
            Err(err) => writeln!(out, "{err}")?,
        }
    }
}

/// Waits for the background decision, animating a spinner on stderr.
fn think(controller: &GameController) -> anyhow::Result<Decision> {
    let mut pending = controller.start_engine_decision()?;
    let mut frames = 0usize;
    while !pending.poll() {
        eprint!("\rEngine thinking {}", SPINNER[frames % SPINNER.len()]);
        frames += 1;
        thread::sleep(SPINNER_TICK);
    }
    if frames > 0 {
        eprint!("\r{:width$}\r", "", width = 20);
    }
    Ok(pending.wait()?)
}

/// `led` is the human's card when the engine answered it, `None` when the engine led.
fn explain(
    out: &mut impl Write,
    decision: &Decision,
    led: Option<Card>,
    top: usize,
) -> io::Result<()> {
    writeln!(
        out,
        "  {} stage, depth {}, {} samples, {} nodes",
        decision.stage, decision.depth, decision.samples, decision.stats.nodes
    )?;
    for candidate in decision.ranked().iter().take(top) {
        let immediate = match led {
            Some(led) if candidate.card.beats(led) => format!("WIN vs {led}"),
            Some(led) => format!("LOSE vs {led}"),
            None => format!(
                "win {:.0}% ({}/{})",
                candidate.win_rate() * 100.0,
                candidate.immediate_wins,
                candidate.immediate_cases
            ),
        };
        writeln!(
            out,
            "  card {:>2}: expected {:+.3}, {immediate}",
            candidate.card.value(),
            candidate.expected_value
        )?;
    }
    Ok(())
}

fn print_round(
    out: &mut impl Write,
    controller: &GameController,
    record: &RoundRecord,
) -> io::Result<()> {
    let human = controller.human();
    let winner = if record.winner == human { "You take" } else { "Engine takes" };
    writeln!(
        out,
        "{winner} the round ({} vs {}).",
        record.card_of(human),
        record.card_of(human.opponent())
    )
}

fn write_transcript(cli: &Cli, controller: &GameController) -> anyhow::Result<()> {
    if let Some(path) = cli.transcript.as_ref() {
        let json = serde_json::to_vec_pretty(&controller.transcript())?;
        fs::write(path, json)
            .with_context(|| format!("writing transcript to {}", path.display()))?;
    }
    Ok(())
}
