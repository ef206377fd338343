use crate::model::card_set::CardSet;
use crate::model::seat::Seat;
use crate::model::trick::RoundRecord;
use serde::{Deserialize, Serialize};

pub const MAX_ROUNDS: usize = 10;

/// Append-only log of completed rounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedHistory {
    rounds: Vec<RoundRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("played history already holds {MAX_ROUNDS} rounds")]
pub struct HistoryFull;

impl PlayedHistory {
    pub fn new() -> Self {
        Self {
            rounds: Vec::with_capacity(MAX_ROUNDS),
        }
    }

    pub fn push(&mut self, record: RoundRecord) -> Result<(), HistoryFull> {
        if self.rounds.len() >= MAX_ROUNDS {
            return Err(HistoryFull);
        }
        self.rounds.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoundRecord> + '_ {
        self.rounds.iter()
    }

    pub fn last(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }

    /// Every card revealed in a completed round.
    pub fn played_cards(&self) -> CardSet {
        self.rounds
            .iter()
            .flat_map(|round| [round.leader_card, round.follower_card])
            .collect()
    }

    /// Cards `seat` has already played.
    pub fn cards_played_by(&self, seat: Seat) -> CardSet {
        self.rounds.iter().map(|round| round.card_of(seat)).collect()
    }

    pub fn rounds_won_by(&self, seat: Seat) -> u32 {
        self.rounds.iter().filter(|round| round.winner == seat).count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::{HistoryFull, MAX_ROUNDS, PlayedHistory};
    use crate::model::card::Card;
    use crate::model::card_set::CardSet;
    use crate::model::seat::Seat;
    use crate::model::trick::RoundRecord;

    fn record(lead: u8, follow: u8) -> RoundRecord {
        let leader_card = Card::new(lead).unwrap();
        let follower_card = Card::new(follow).unwrap();
        let winner = if follower_card.beats(leader_card) {
            Seat::South
        } else {
            Seat::North
        };
        RoundRecord {
            leader: Seat::North,
            leader_card,
            follower_card,
            winner,
        }
    }

    #[test]
    fn played_cards_collects_both_sides() {
        let mut history = PlayedHistory::new();
        history.push(record(4, 9)).unwrap();
        history.push(record(22, 1)).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.played_cards(), CardSet::from_values(&[1, 4, 9, 22]));
        assert_eq!(history.cards_played_by(Seat::South), CardSet::from_values(&[1, 9]));
        assert_eq!(history.rounds_won_by(Seat::North), 1);
    }

    #[test]
    fn rejects_an_eleventh_round() {
        let mut history = PlayedHistory::new();
        for value in 0..MAX_ROUNDS as u8 {
            history.push(record(value * 2 + 1, value * 2 + 2)).unwrap();
        }
        assert_eq!(history.push(record(29, 30)), Err(HistoryFull));
        assert_eq!(history.len(), MAX_ROUNDS);
    }
}
