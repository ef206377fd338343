//! Read-only snapshot handed to the decision engine.
//!
//! A [`GameState`] is built from one seat's point of view: its own hand, how many cards the
//! opponent still holds, the completed rounds, the running score and who leads the current round.
//! Construction validates the snapshot and derives the pool of cards the opponent may hold.

use crate::model::card::Card;
use crate::model::card_set::CardSet;
use crate::model::history::{MAX_ROUNDS, PlayedHistory};
use serde::{Deserialize, Serialize};

/// Who opens the round the snapshot is taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "side", content = "card")]
pub enum Lead {
    /// The engine's side plays first.
    Ai,
    /// The opponent already revealed this card and the engine responds.
    Opponent(Card),
}

impl Lead {
    pub fn revealed_card(self) -> Option<Card> {
        match self {
            Lead::Ai => None,
            Lead::Opponent(card) => Some(card),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("hand of {size} cards exceeds the {MAX_ROUNDS}-card limit")]
    HandTooLarge { size: usize },
    #[error("played history holds {len} rounds, more than {MAX_ROUNDS}")]
    HistoryTooLong { len: usize },
    #[error("cards {cards} appear both in hand and in the played history")]
    HandOverlapsHistory { cards: CardSet },
    #[error("revealed lead card {card} is already accounted for")]
    LeadCardKnown { card: Card },
    #[error("opponent holds {opponent} cards but the engine holds {ai} with lead {lead:?}")]
    HandSizeMismatch { ai: usize, opponent: usize, lead: Lead },
    #[error("unknown pool {pool} overlaps known cards")]
    PoolOverlapsKnown { pool: CardSet },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    ai_hand: CardSet,
    opponent_hand_size: usize,
    history: PlayedHistory,
    ai_score: u32,
    opponent_score: u32,
    lead: Lead,
    unknown_pool: CardSet,
}

impl GameState {
    pub fn new(
        ai_hand: CardSet,
        opponent_hand_size: usize,
        history: PlayedHistory,
        ai_score: u32,
        opponent_score: u32,
        lead: Lead,
    ) -> Result<Self, StateError> {
        if ai_hand.len() > MAX_ROUNDS {
            return Err(StateError::HandTooLarge {
                size: ai_hand.len(),
            });
        }
        if history.len() > MAX_ROUNDS {
            return Err(StateError::HistoryTooLong { len: history.len() });
        }
        let played = history.played_cards();
        let overlap = ai_hand.intersection(played);
        if !overlap.is_empty() {
            return Err(StateError::HandOverlapsHistory { cards: overlap });
        }
        if let Lead::Opponent(card) = lead
            && (ai_hand.contains(card) || played.contains(card))
        {
            return Err(StateError::LeadCardKnown { card });
        }
        let expected_opponent = match lead {
            Lead::Ai => Some(ai_hand.len()),
            Lead::Opponent(_) => ai_hand.len().checked_sub(1),
        };
        if expected_opponent != Some(opponent_hand_size) {
            return Err(StateError::HandSizeMismatch {
                ai: ai_hand.len(),
                opponent: opponent_hand_size,
                lead,
            });
        }

        let mut known = ai_hand.union(played);
        if let Some(card) = lead.revealed_card() {
            known.add(card);
        }
        let unknown_pool = CardSet::FULL_DECK.difference(known);

        Ok(Self {
            ai_hand,
            opponent_hand_size,
            history,
            ai_score,
            opponent_score,
            lead,
            unknown_pool,
        })
    }

    /// Replaces the derived pool with a narrower one when the caller knows more about the
    /// opponent's holding than the history reveals.
    pub fn with_unknown_pool(mut self, pool: CardSet) -> Result<Self, StateError> {
        let mut known = self.ai_hand.union(self.history.played_cards());
        if let Some(card) = self.lead.revealed_card() {
            known.add(card);
        }
        if !pool.is_disjoint(known) {
            return Err(StateError::PoolOverlapsKnown { pool });
        }
        self.unknown_pool = pool;
        Ok(self)
    }

    pub fn ai_hand(&self) -> CardSet {
        self.ai_hand
    }

    pub fn opponent_hand_size(&self) -> usize {
        self.opponent_hand_size
    }

    pub fn history(&self) -> &PlayedHistory {
        &self.history
    }

    pub fn ai_score(&self) -> u32 {
        self.ai_score
    }

    pub fn opponent_score(&self) -> u32 {
        self.opponent_score
    }

    pub fn score_differential(&self) -> i32 {
        self.ai_score as i32 - self.opponent_score as i32
    }

    pub fn lead(&self) -> Lead {
        self.lead
    }

    pub fn ai_leads(&self) -> bool {
        matches!(self.lead, Lead::Ai)
    }

    pub fn unknown_pool(&self) -> CardSet {
        self.unknown_pool
    }

    pub fn rounds_completed(&self) -> usize {
        self.history.len()
    }

    /// Rounds left including the current one. The engine has not played yet, so this is the
    /// size of its hand.
    pub fn rounds_remaining(&self) -> usize {
        self.ai_hand.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{GameState, Lead, StateError};
    use crate::model::card::Card;
    use crate::model::card_set::CardSet;
    use crate::model::history::PlayedHistory;
    use crate::model::seat::Seat;
    use crate::model::trick::RoundRecord;

    fn card(value: u8) -> Card {
        Card::new(value).unwrap()
    }

    fn history_of(rounds: &[(u8, u8)]) -> PlayedHistory {
        let mut history = PlayedHistory::new();
        for &(lead, follow) in rounds {
            let winner = if follow > lead { Seat::South } else { Seat::North };
            history
                .push(RoundRecord {
                    leader: Seat::North,
                    leader_card: card(lead),
                    follower_card: card(follow),
                    winner,
                })
                .unwrap();
        }
        history
    }

    #[test]
    fn pool_excludes_hand_and_played_cards() {
        let hand = CardSet::from_values(&[2, 5, 30]);
        let history = history_of(&[(10, 11)]);
        let state = GameState::new(hand, 3, history, 1, 0, Lead::Ai).unwrap();
        let pool = state.unknown_pool();
        assert_eq!(pool.len(), 30 - 3 - 2);
        assert!(pool.is_disjoint(hand));
        assert!(!pool.contains(card(10)));
        assert!(!pool.contains(card(11)));
        assert_eq!(state.score_differential(), 1);
        assert_eq!(state.rounds_remaining(), 3);
        assert_eq!(state.rounds_completed(), 1);
    }

    #[test]
    fn revealed_lead_card_leaves_the_pool() {
        let hand = CardSet::from_values(&[4, 8]);
        let state = GameState::new(hand, 1, PlayedHistory::new(), 0, 0, Lead::Opponent(card(19)))
            .unwrap();
        assert!(!state.unknown_pool().contains(card(19)));
        assert!(!state.ai_leads());
        assert_eq!(state.lead().revealed_card(), Some(card(19)));
    }

    #[test]
    fn rejects_hand_overlapping_history() {
        let hand = CardSet::from_values(&[10, 12]);
        let history = history_of(&[(10, 11)]);
        let err = GameState::new(hand, 2, history, 0, 0, Lead::Ai).unwrap_err();
        assert_eq!(
            err,
            StateError::HandOverlapsHistory {
                cards: CardSet::from_values(&[10])
            }
        );
    }

    #[test]
    fn rejects_lead_card_from_own_hand() {
        let hand = CardSet::from_values(&[4, 8]);
        let err =
            GameState::new(hand, 1, PlayedHistory::new(), 0, 0, Lead::Opponent(card(4))).unwrap_err();
        assert_eq!(err, StateError::LeadCardKnown { card: card(4) });
    }

    #[test]
    fn rejects_mismatched_hand_sizes() {
        let hand = CardSet::from_values(&[4, 8]);
        assert!(matches!(
            GameState::new(hand, 3, PlayedHistory::new(), 0, 0, Lead::Ai),
            Err(StateError::HandSizeMismatch { .. })
        ));
        assert!(matches!(
            GameState::new(hand, 2, PlayedHistory::new(), 0, 0, Lead::Opponent(card(9))),
            Err(StateError::HandSizeMismatch { .. })
        ));
    }

    #[test]
    fn narrowed_pool_must_stay_unknown() {
        let hand = CardSet::from_values(&[7]);
        let state = GameState::new(hand, 1, PlayedHistory::new(), 0, 0, Lead::Ai).unwrap();
        let narrowed = state
            .clone()
            .with_unknown_pool(CardSet::from_values(&[3]))
            .unwrap();
        assert_eq!(narrowed.unknown_pool(), CardSet::from_values(&[3]));
        assert!(matches!(
            state.with_unknown_pool(CardSet::from_values(&[3, 7])),
            Err(StateError::PoolOverlapsKnown { .. })
        ));
    }
}
