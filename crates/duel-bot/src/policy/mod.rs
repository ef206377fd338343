mod greedy;
mod search;

pub use greedy::GreedyPolicy;
pub use search::SearchPolicy;

use crate::engine::EngineError;
use duel_core::game::state::GameState;
use duel_core::model::card::Card;
use duel_core::model::seat::Seat;
use tracing::{Level, event};

/// Context provided to policies for decision-making
pub struct PolicyContext<'a> {
    pub seat: Seat,
    pub state: &'a GameState,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("{seat} has no cards left to play")]
    EmptyHand { seat: Seat },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Unified interface for choosing a card, shared by the search engine and simple baselines
pub trait Policy: Send {
    fn name(&self) -> &str;

    /// Choose 1 card to play from the context's hand
    fn choose_play(&mut self, ctx: &PolicyContext) -> Result<Card, PolicyError>;
}

fn log_play_decision(ctx: &PolicyContext, policy: &str, chosen: Card, reason: &str) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    let hand = ctx.state.ai_hand();
    let hand_preview = if hand.len() <= 6 {
        hand.to_string()
    } else {
        format!("{} cards", hand.len())
    };
    let led = ctx
        .state
        .lead()
        .revealed_card()
        .map(|card| card.value())
        .unwrap_or(0);

    event!(
        target: "duel_bot::play",
        Level::INFO,
        seat = ctx.seat.as_str(),
        policy,
        hand = %hand_preview,
        led,
        round = ctx.state.rounds_completed() + 1,
        score_diff = ctx.state.score_differential(),
        chosen = chosen.value(),
        reason,
    );
}
