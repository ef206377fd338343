//! Weighted leaf scoring of fully known positions.

use crate::config::{SignalWeights, Stage, StageBands, WeightTable};
use duel_core::model::card_set::CardSet;

/// Fully known position at a search leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalNode {
    pub ai: CardSet,
    pub opponent: CardSet,
    pub score_diff: i32,
    pub rounds_remaining: usize,
}

/// Raw signal values, before weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    pub score: f64,
    pub high_card: f64,
    pub top_card: f64,
    pub card_count: f64,
    pub spread: f64,
    pub hand_value: f64,
}

impl Signals {
    pub fn of(node: &EvalNode) -> Self {
        let count = |set: CardSet| set.len() as f64;
        Self {
            score: f64::from(node.score_diff),
            high_card: node.ai.count_high() as f64 - node.opponent.count_high() as f64,
            top_card: node.ai.count_top() as f64 - node.opponent.count_top() as f64,
            card_count: count(node.ai) - count(node.opponent),
            spread: f64::from(node.ai.spread()) - f64::from(node.opponent.spread()),
            hand_value: f64::from(node.ai.total_value()) - f64::from(node.opponent.total_value()),
        }
    }

    pub fn weighted(&self, weights: &SignalWeights) -> Signals {
        Signals {
            score: self.score * weights.score,
            high_card: self.high_card * weights.high_card,
            top_card: self.top_card * weights.top_card,
            card_count: self.card_count * weights.card_count,
            spread: self.spread * weights.spread,
            hand_value: self.hand_value * weights.hand_value,
        }
    }

    pub fn total(&self) -> f64 {
        self.score + self.high_card + self.top_card + self.card_count + self.spread + self.hand_value
    }
}

/// Stage-adaptive weighted sum of hand signals. Positive favors the engine's side.
#[derive(Debug, Clone)]
pub struct Evaluator {
    bands: StageBands,
    weights: WeightTable,
}

impl Evaluator {
    pub fn new(bands: StageBands, weights: WeightTable) -> Self {
        Self { bands, weights }
    }

    pub fn stage_for(&self, rounds_remaining: usize) -> Stage {
        self.bands.stage_for(rounds_remaining)
    }

    pub fn weights_for(&self, rounds_remaining: usize) -> &SignalWeights {
        self.weights.for_stage(self.stage_for(rounds_remaining))
    }

    pub fn evaluate(&self, node: &EvalNode) -> f64 {
        self.breakdown(node).total()
    }

    /// Per-signal weighted contributions.
    pub fn breakdown(&self, node: &EvalNode) -> Signals {
        Signals::of(node).weighted(self.weights_for(node.rounds_remaining))
    }
}
