use super::{Policy, PolicyContext, PolicyError, log_play_decision};
use duel_core::game::state::Lead;
use duel_core::model::card::Card;

/// Baseline that spends as little as possible: win a round with the cheapest card that does it,
/// otherwise throw the lowest card.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyPolicy;

impl GreedyPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl Policy for GreedyPolicy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn choose_play(&mut self, ctx: &PolicyContext) -> Result<Card, PolicyError> {
        let hand = ctx.state.ai_hand();
        let lowest = hand.min().ok_or(PolicyError::EmptyHand { seat: ctx.seat })?;
        let (card, reason) = match ctx.state.lead() {
            Lead::Ai => (lowest, "lead_lowest"),
            Lead::Opponent(led) => match hand.lowest_above(led) {
                Some(winner) => (winner, "cheapest_winner"),
                None => (lowest, "dump_lowest"),
            },
        };
        log_play_decision(ctx, self.name(), card, reason);
        Ok(card)
    }
}
