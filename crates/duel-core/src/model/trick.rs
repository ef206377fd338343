use crate::model::card::Card;
use crate::model::seat::Seat;
use serde::{Deserialize, Serialize};

/// One round in progress: the leader plays first, then the follower.
#[derive(Debug, Clone)]
pub struct Trick {
    leader: Seat,
    plays: Vec<Play>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub seat: Seat,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrickError {
    #[error("round already complete")]
    TrickComplete,
    #[error("expected {expected} to play next but got {actual}")]
    OutOfTurn { expected: Seat, actual: Seat },
}

impl Trick {
    pub fn new(leader: Seat) -> Self {
        Self {
            leader,
            plays: Vec::with_capacity(2),
        }
    }

    pub fn leader(&self) -> Seat {
        self.leader
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn is_complete(&self) -> bool {
        self.plays.len() == 2
    }

    pub fn led_card(&self) -> Option<Card> {
        self.plays.first().map(|play| play.card)
    }

    pub fn expected_seat(&self) -> Option<Seat> {
        match self.plays.len() {
            0 => Some(self.leader),
            1 => Some(self.leader.opponent()),
            _ => None,
        }
    }

    pub fn play(&mut self, seat: Seat, card: Card) -> Result<(), TrickError> {
        let expected = self.expected_seat().ok_or(TrickError::TrickComplete)?;
        if expected != seat {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: seat,
            });
        }
        self.plays.push(Play { seat, card });
        Ok(())
    }

    pub fn winner(&self) -> Option<Seat> {
        match self.plays.as_slice() {
            [lead, follow] => Some(if follow.card.beats(lead.card) {
                follow.seat
            } else {
                lead.seat
            }),
            _ => None,
        }
    }

    /// Closes a complete round into a history record.
    pub fn record(&self) -> Option<RoundRecord> {
        let winner = self.winner()?;
        match self.plays.as_slice() {
            [lead, follow] => Some(RoundRecord {
                leader: lead.seat,
                leader_card: lead.card,
                follower_card: follow.card,
                winner,
            }),
            _ => None,
        }
    }
}

/// Completed round as stored in the played history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub leader: Seat,
    pub leader_card: Card,
    pub follower_card: Card,
    pub winner: Seat,
}

impl RoundRecord {
    pub fn follower(&self) -> Seat {
        self.leader.opponent()
    }

    pub fn card_of(&self, seat: Seat) -> Card {
        if seat == self.leader {
            self.leader_card
        } else {
            self.follower_card
        }
    }
}
