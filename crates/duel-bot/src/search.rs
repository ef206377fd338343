//! Depth-limited minimax with alpha-beta pruning over fully known hands.
//!
//! Depth counts rounds, not plies. Each simulated round is dispatched once on [`RoundRole`]: when
//! the engine's side leads it maximizes over its own cards and the opponent answers with a
//! minimizing reply; when the opponent leads the order flips. The round winner leads the next
//! simulated round.

use crate::evaluator::{EvalNode, Evaluator};
use duel_core::model::card::Card;
use duel_core::model::card_set::CardSet;

/// Which side of the current round the engine is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundRole {
    Leader,
    Follower,
}

/// Concrete position between rounds, seen from the engine's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchNode {
    pub ai: CardSet,
    pub opponent: CardSet,
    pub score_diff: i32,
    pub role: RoundRole,
}

impl SearchNode {
    /// Position after the engine plays `ai_card` against `opponent_card`.
    pub fn after_round(&self, ai_card: Card, opponent_card: Card) -> SearchNode {
        let ai_wins = ai_card.beats(opponent_card);
        SearchNode {
            ai: self.ai.without(ai_card),
            opponent: self.opponent.without(opponent_card),
            score_diff: self.score_diff + if ai_wins { 1 } else { -1 },
            role: if ai_wins {
                RoundRole::Leader
            } else {
                RoundRole::Follower
            },
        }
    }

    pub fn rounds_remaining(&self) -> usize {
        self.ai.len().max(self.opponent.len())
    }

    fn eval_node(&self) -> EvalNode {
        EvalNode {
            ai: self.ai,
            opponent: self.opponent,
            score_diff: self.score_diff,
            rounds_remaining: self.rounds_remaining(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub leaves: u64,
    pub cutoffs: u64,
}

impl SearchStats {
    pub fn absorb(&mut self, other: SearchStats) {
        self.nodes += other.nodes;
        self.leaves += other.leaves;
        self.cutoffs += other.cutoffs;
    }
}

pub struct MinimaxSearch<'a> {
    evaluator: &'a Evaluator,
    pruning: bool,
    stats: SearchStats,
}

impl<'a> MinimaxSearch<'a> {
    pub fn new(evaluator: &'a Evaluator, pruning: bool) -> Self {
        Self {
            evaluator,
            pruning,
            stats: SearchStats::default(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Value of `node` looking `depth` rounds ahead.
    pub fn search(&mut self, node: &SearchNode, depth: usize) -> f64 {
        self.value(node, depth, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Value of leading `card` from `node`, where the current round is the first of `depth`.
    pub fn evaluate_lead(&mut self, node: &SearchNode, card: Card, depth: usize) -> f64 {
        if node.opponent.is_empty() || depth == 0 {
            let mut leaf = *node;
            leaf.ai = node.ai.without(card);
            return self.search(&leaf, 0);
        }
        self.stats.nodes += 1;
        self.opponent_responds(node, card, depth, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Value of answering the revealed `led` card with `card`. The current round is already
    /// decided, so `depth` rounds are searched after it, capped at what the hands can play.
    pub fn evaluate_response(
        &mut self,
        node: &SearchNode,
        led: Card,
        card: Card,
        depth: usize,
    ) -> f64 {
        let child = node.after_round(card, led);
        self.search(&child, depth.min(child.rounds_remaining()))
    }

    fn value(&mut self, node: &SearchNode, depth: usize, alpha: f64, beta: f64) -> f64 {
        self.stats.nodes += 1;
        if depth == 0 || node.ai.is_empty() || node.opponent.is_empty() {
            self.stats.leaves += 1;
            return self.evaluator.evaluate(&node.eval_node());
        }
        match node.role {
            RoundRole::Leader => self.ai_leads(node, depth, alpha, beta),
            RoundRole::Follower => self.opponent_leads(node, depth, alpha, beta),
        }
    }

    fn ai_leads(&mut self, node: &SearchNode, depth: usize, mut alpha: f64, beta: f64) -> f64 {
        let mut best = f64::NEG_INFINITY;
        for card in node.ai.iter_desc() {
            let value = self.opponent_responds(node, card, depth, alpha, beta);
            best = best.max(value);
            alpha = alpha.max(best);
            if self.pruning && alpha >= beta {
                self.stats.cutoffs += 1;
                break;
            }
        }
        best
    }

    fn opponent_responds(
        &mut self,
        node: &SearchNode,
        led: Card,
        depth: usize,
        alpha: f64,
        mut beta: f64,
    ) -> f64 {
        let mut best = f64::INFINITY;
        for reply in node.opponent.iter() {
            let child = node.after_round(led, reply);
            let value = self.value(&child, depth - 1, alpha, beta);
            best = best.min(value);
            beta = beta.min(best);
            if self.pruning && alpha >= beta {
                self.stats.cutoffs += 1;
                break;
            }
        }
        best
    }

    fn opponent_leads(&mut self, node: &SearchNode, depth: usize, alpha: f64, mut beta: f64) -> f64 {
        let mut best = f64::INFINITY;
        for led in node.opponent.iter() {
            let value = self.ai_responds(node, led, depth, alpha, beta);
            best = best.min(value);
            beta = beta.min(best);
            if self.pruning && alpha >= beta {
                self.stats.cutoffs += 1;
                break;
            }
        }
        best
    }

    fn ai_responds(
        &mut self,
        node: &SearchNode,
        led: Card,
        depth: usize,
        mut alpha: f64,
        beta: f64,
    ) -> f64 {
        let mut best = f64::NEG_INFINITY;
        for card in node.ai.iter_desc() {
            let child = node.after_round(card, led);
            let value = self.value(&child, depth - 1, alpha, beta);
            best = best.max(value);
            alpha = alpha.max(best);
            if self.pruning && alpha >= beta {
                self.stats.cutoffs += 1;
                break;
            }
        }
        best
    }
}
