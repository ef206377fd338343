use super::{Policy, PolicyContext, PolicyError, log_play_decision};
use crate::engine::{Decision, Engine};
use duel_core::model::card::Card;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Policy backed by the sampling minimax engine, with a private seeded generator.
pub struct SearchPolicy {
    engine: Engine,
    rng: SmallRng,
    last_decision: Option<Decision>,
}

impl SearchPolicy {
    pub fn new(engine: Engine, seed: u64) -> Self {
        Self {
            engine,
            rng: SmallRng::seed_from_u64(seed),
            last_decision: None,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn last_decision(&self) -> Option<&Decision> {
        self.last_decision.as_ref()
    }
}

impl Policy for SearchPolicy {
    fn name(&self) -> &str {
        "search"
    }

    fn choose_play(&mut self, ctx: &PolicyContext) -> Result<Card, PolicyError> {
        if ctx.state.ai_hand().is_empty() {
            return Err(PolicyError::EmptyHand { seat: ctx.seat });
        }
        let decision = self.engine.decide(ctx.state, &mut self.rng)?;
        let card = decision.card;
        log_play_decision(ctx, self.name(), card, decision.stage.as_str());
        self.last_decision = Some(decision);
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::SearchPolicy;
    use crate::config::EngineConfig;
    use crate::engine::Engine;
    use crate::policy::{Policy, PolicyContext};
    use duel_core::game::match_state::MatchState;
    use duel_core::model::seat::Seat;

    #[test]
    fn plays_a_full_match_legally() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let mut north = SearchPolicy::new(engine.clone(), 1);
        let mut south = SearchPolicy::new(engine, 2);
        let mut state = MatchState::with_seed(Seat::North, 77);
        while let Some(seat) = state.expected_to_play() {
            let view = state.view_for(seat).unwrap();
            let ctx = PolicyContext {
                seat,
                state: &view,
            };
            let policy = match seat {
                Seat::North => &mut north,
                Seat::South => &mut south,
            };
            let card = policy.choose_play(&ctx).unwrap();
            assert!(view.ai_hand().contains(card));
            assert_eq!(policy.last_decision().map(|d| d.card), Some(card));
            state.play_card(seat, card).unwrap();
        }
        assert!(state.is_complete());
    }
}
