//! Decision orchestrator.
//!
//! One decision draws a single ensemble of opponent hands from the unknown pool, searches every
//! candidate card against every sampled hand and picks the card with the best mean value.

use crate::config::{ConfigError, EngineConfig, SearchBudget, Stage};
use crate::evaluator::Evaluator;
use crate::search::{MinimaxSearch, RoundRole, SearchNode, SearchStats};
use duel_core::game::state::{GameState, Lead};
use duel_core::model::card::Card;
use duel_core::model::card_set::CardSet;
use duel_core::sampler::{OpponentSampler, SamplingError, SamplingStats};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;
use tracing::{Level, event};

/// Expected values closer than this are treated as equal and resolved towards the lower card.
pub const TIE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("no cards available to play")]
    NoCardsAvailable,
    #[error(transparent)]
    InsufficientPool(#[from] SamplingError),
    #[error("invalid engine configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateEvaluation {
    pub card: Card,
    pub expected_value: f64,
    /// Current-round showdowns this card wins. When leading, every card of every sampled hand
    /// is one showdown; when following, each sample replays the revealed card.
    pub immediate_wins: usize,
    pub immediate_cases: usize,
}

impl CandidateEvaluation {
    /// Share of current-round showdowns won, in `0.0..=1.0`.
    pub fn win_rate(&self) -> f64 {
        if self.immediate_cases == 0 {
            return 0.0;
        }
        self.immediate_wins as f64 / self.immediate_cases as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub card: Card,
    pub stage: Stage,
    pub depth: usize,
    pub samples: usize,
    /// One entry per card in hand, ascending by card value.
    pub evaluations: Vec<CandidateEvaluation>,
    #[serde(skip)]
    pub stats: SearchStats,
}

impl Decision {
    pub fn expected_value_of(&self, card: Card) -> Option<f64> {
        self.evaluations
            .iter()
            .find(|candidate| candidate.card == card)
            .map(|candidate| candidate.expected_value)
    }

    /// Candidates from best to worst.
    pub fn ranked(&self) -> Vec<CandidateEvaluation> {
        let mut ranked = self.evaluations.clone();
        ranked.sort_by(|a, b| {
            b.expected_value
                .total_cmp(&a.expected_value)
                .then(a.card.cmp(&b.card))
        });
        ranked
    }
}

/// Search parameters resolved for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPlan {
    pub stage: Stage,
    pub depth: usize,
    pub samples: usize,
}

#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    evaluator: Evaluator,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let evaluator = Evaluator::new(config.bands, config.weights);
        Ok(Self { config, evaluator })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn plan(&self, state: &GameState) -> SearchPlan {
        let rounds = state.rounds_remaining();
        let stage = self.config.bands.stage_for(rounds);
        let SearchBudget { depth, samples } = self.config.schedule.for_stage(stage);
        SearchPlan {
            stage,
            depth: depth.min(rounds).max(1),
            samples,
        }
    }

    pub fn decide_with_seed(&self, state: &GameState, seed: u64) -> Result<Decision, EngineError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        self.decide(state, &mut rng)
    }

    pub fn decide<R: Rng + ?Sized>(
        &self,
        state: &GameState,
        rng: &mut R,
    ) -> Result<Decision, EngineError> {
        let hand = state.ai_hand();
        if hand.is_empty() {
            return Err(EngineError::NoCardsAvailable);
        }

        let plan = self.plan(state);
        let mut sampling = SamplingStats::default();
        let ensemble = OpponentSampler::sample_ensemble(
            state.unknown_pool(),
            state.opponent_hand_size(),
            plan.samples,
            rng,
            Some(&mut sampling),
        )?;

        let mut search = MinimaxSearch::new(&self.evaluator, self.config.pruning);
        let evaluations: Vec<CandidateEvaluation> = hand
            .iter()
            .map(|card| self.evaluate_candidate(&mut search, state, &ensemble, card, plan))
            .collect();

        let card = select_best(&evaluations).ok_or(EngineError::NoCardsAvailable)?;
        let decision = Decision {
            card,
            stage: plan.stage,
            depth: plan.depth,
            samples: plan.samples,
            evaluations,
            stats: search.stats(),
        };
        log_decision(state, &decision, &sampling);
        Ok(decision)
    }

    fn evaluate_candidate(
        &self,
        search: &mut MinimaxSearch<'_>,
        state: &GameState,
        ensemble: &[CardSet],
        card: Card,
        plan: SearchPlan,
    ) -> CandidateEvaluation {
        let role = match state.lead() {
            Lead::Ai => RoundRole::Leader,
            Lead::Opponent(_) => RoundRole::Follower,
        };
        let mut total = 0.0;
        let mut immediate_wins = 0;
        let mut immediate_cases = 0;
        for &opponent in ensemble {
            let node = SearchNode {
                ai: state.ai_hand(),
                opponent,
                score_diff: state.score_differential(),
                role,
            };
            total += match state.lead() {
                Lead::Ai => {
                    immediate_wins += opponent.iter().filter(|&reply| card.beats(reply)).count();
                    immediate_cases += opponent.len();
                    search.evaluate_lead(&node, card, plan.depth)
                }
                Lead::Opponent(led) => {
                    immediate_wins += usize::from(card.beats(led));
                    immediate_cases += 1;
                    search.evaluate_response(&node, led, card, plan.depth)
                }
            };
        }
        CandidateEvaluation {
            card,
            expected_value: total / ensemble.len().max(1) as f64,
            immediate_wins,
            immediate_cases,
        }
    }
}

/// Highest expected value wins; near-ties go to the lowest card.
fn select_best(evaluations: &[CandidateEvaluation]) -> Option<Card> {
    let mut best: Option<CandidateEvaluation> = None;
    for candidate in evaluations {
        match best {
            None => best = Some(*candidate),
            Some(current) => {
                let better = candidate.expected_value > current.expected_value + TIE_EPSILON;
                let tied_lower = (candidate.expected_value - current.expected_value).abs()
                    <= TIE_EPSILON
                    && candidate.card < current.card;
                if better || tied_lower {
                    best = Some(*candidate);
                }
            }
        }
    }
    best.map(|candidate| candidate.card)
}

fn log_decision(state: &GameState, decision: &Decision, sampling: &SamplingStats) {
    if tracing::enabled!(Level::INFO) {
        let expected = decision
            .expected_value_of(decision.card)
            .unwrap_or(f64::NAN);
        event!(
            target: "duel_bot::decision",
            Level::INFO,
            stage = decision.stage.as_str(),
            depth = decision.depth,
            samples = decision.samples,
            rounds_remaining = state.rounds_remaining(),
            ai_leads = state.ai_leads(),
            candidates = decision.evaluations.len(),
            chosen = decision.card.value(),
            expected_value = expected,
            nodes = decision.stats.nodes,
        );
    }
    event!(
        target: "duel_bot::decision",
        Level::DEBUG,
        nodes = decision.stats.nodes,
        leaves = decision.stats.leaves,
        cutoffs = decision.stats.cutoffs,
        draws = sampling.draws,
        cards_drawn = sampling.cards_drawn,
        pool = state.unknown_pool().len(),
    );
}

#[cfg(test)]
mod tests {
    use super::{CandidateEvaluation, Engine, EngineError, select_best};
    use crate::config::{EngineConfig, Stage};
    use crate::search::{MinimaxSearch, RoundRole, SearchNode};
    use duel_core::game::state::{GameState, Lead};
    use duel_core::model::card::Card;
    use duel_core::model::card_set::CardSet;
    use duel_core::model::history::PlayedHistory;
    use duel_core::sampler::{OpponentSampler, SamplingError};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn card(value: u8) -> Card {
        Card::new(value).unwrap()
    }

    fn candidate(value: u8, expected_value: f64) -> CandidateEvaluation {
        CandidateEvaluation {
            card: card(value),
            expected_value,
            immediate_wins: 0,
            immediate_cases: 0,
        }
    }

    fn following(hand: &[u8], led: u8) -> GameState {
        let hand = CardSet::from_values(hand);
        GameState::new(
            hand,
            hand.len() - 1,
            PlayedHistory::new(),
            0,
            0,
            Lead::Opponent(card(led)),
        )
        .unwrap()
    }

    fn leading(hand: &[u8]) -> GameState {
        let hand = CardSet::from_values(hand);
        GameState::new(hand, hand.len(), PlayedHistory::new(), 0, 0, Lead::Ai).unwrap()
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn invalid_configuration_is_rejected_up_front() {
        let mut config = EngineConfig::default();
        config.schedule.early.samples = 0;
        assert!(matches!(
            Engine::new(config),
            Err(EngineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn empty_hand_has_no_cards_available() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let state = GameState::new(CardSet::EMPTY, 0, PlayedHistory::new(), 5, 5, Lead::Ai).unwrap();
        assert_eq!(
            engine.decide_with_seed(&state, 1),
            Err(EngineError::NoCardsAvailable)
        );
    }

    #[test]
    fn narrowed_pool_smaller_than_opponent_hand_fails() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let state = leading(&[4, 9])
            .with_unknown_pool(CardSet::from_values(&[12]))
            .unwrap();
        assert_eq!(
            engine.decide_with_seed(&state, 3),
            Err(EngineError::InsufficientPool(
                SamplingError::InsufficientPool {
                    requested: 2,
                    available: 1
                }
            ))
        );
    }

    #[test]
    fn plan_caps_depth_at_rounds_remaining() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let plan = engine.plan(&leading(&[3, 17]));
        assert_eq!(plan.stage, Stage::Endgame);
        assert_eq!(plan.depth, 2);
        assert_eq!(plan.samples, 7);

        let plan = engine.plan(&leading(&[1, 3, 5, 7, 9, 11, 13, 15, 17, 19]));
        assert_eq!(plan.stage, Stage::Early);
        assert_eq!(plan.depth, 3);
    }

    #[test]
    fn ties_go_to_the_lowest_card() {
        let evaluations = [candidate(4, 1.0), candidate(9, 1.0 + 1e-12), candidate(20, 0.5)];
        assert_eq!(select_best(&evaluations), Some(card(4)));

        let evaluations = [candidate(4, 1.0), candidate(9, 1.5)];
        assert_eq!(select_best(&evaluations), Some(card(9)));
        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn decision_reports_every_candidate() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let state = leading(&[2, 11, 23, 29]);
        let decision = engine.decide_with_seed(&state, 99).unwrap();
        let cards: Vec<Card> = decision.evaluations.iter().map(|c| c.card).collect();
        assert_eq!(cards, state.ai_hand().to_vec());
        assert!(state.ai_hand().contains(decision.card));
        let ranked = decision.ranked();
        let chosen = decision.expected_value_of(decision.card).unwrap();
        assert!((ranked[0].expected_value - chosen).abs() <= 1e-9);
        assert!(decision.stats.nodes > 0);
    }

    #[test]
    fn midgame_follow_searches_the_full_depth_after_the_revealed_card() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let state = following(&[2, 6, 11, 17, 21, 26, 29], 15);
        let plan = engine.plan(&state);
        assert_eq!(plan.stage, Stage::Midgame);
        assert_eq!(plan.depth, 4);

        let seed = 41;
        let decision = engine.decide_with_seed(&state, seed).unwrap();
        let mut rng = SmallRng::seed_from_u64(seed);
        let ensemble = OpponentSampler::sample_ensemble(
            state.unknown_pool(),
            state.opponent_hand_size(),
            plan.samples,
            &mut rng,
            None,
        )
        .unwrap();

        let mean_at = |played: Card, depth: usize| {
            let mut search = MinimaxSearch::new(engine.evaluator(), true);
            let total: f64 = ensemble
                .iter()
                .map(|&opponent| {
                    let node = SearchNode {
                        ai: state.ai_hand(),
                        opponent,
                        score_diff: 0,
                        role: RoundRole::Follower,
                    };
                    search.search(&node.after_round(played, card(15)), depth)
                })
                .sum();
            total / ensemble.len() as f64
        };

        for evaluation in &decision.evaluations {
            let full = mean_at(evaluation.card, 4);
            assert!(
                (evaluation.expected_value - full).abs() < 1e-9,
                "card {}: {} vs {}",
                evaluation.card,
                evaluation.expected_value,
                full
            );
        }
        assert!(
            decision
                .evaluations
                .iter()
                .any(|evaluation| (evaluation.expected_value - mean_at(evaluation.card, 3)).abs()
                    > 1e-9)
        );
    }

    #[test]
    fn follow_candidates_report_whether_they_take_the_round() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let state = following(&[4, 12, 25], 10);
        let decision = engine.decide_with_seed(&state, 5).unwrap();
        for evaluation in &decision.evaluations {
            assert_eq!(evaluation.immediate_cases, decision.samples);
            let expected = if evaluation.card.value() > 10 { 1.0 } else { 0.0 };
            assert_eq!(evaluation.win_rate(), expected);
        }
    }

    #[test]
    fn lead_candidates_count_wins_across_the_ensemble() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let state = leading(&[1, 16, 30])
            .with_unknown_pool(CardSet::from_values(&[5, 9, 20, 24]))
            .unwrap();
        let decision = engine.decide_with_seed(&state, 8).unwrap();
        let by_card = |value: u8| {
            decision
                .evaluations
                .iter()
                .find(|evaluation| evaluation.card == card(value))
                .copied()
                .unwrap()
        };
        let cases = decision.samples * 3;

        let lowest = by_card(1);
        assert_eq!((lowest.immediate_wins, lowest.immediate_cases), (0, cases));
        let highest = by_card(30);
        assert_eq!((highest.immediate_wins, highest.immediate_cases), (cases, cases));
        let middle = by_card(16);
        assert!(middle.immediate_wins > 0 && middle.immediate_wins < cases);
        assert!(middle.win_rate() > 0.0 && middle.win_rate() < 1.0);
    }
}
