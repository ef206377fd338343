use crate::game::state::{GameState, Lead, StateError};
use crate::model::card::Card;
use crate::model::card_set::CardSet;
use crate::model::deck::{Deal, Deck};
use crate::model::history::{HistoryFull, MAX_ROUNDS, PlayedHistory};
use crate::model::score::ScoreBoard;
use crate::model::seat::Seat;
use crate::model::trick::{RoundRecord, Trick, TrickError};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayError {
    #[error("match is already complete")]
    MatchComplete,
    #[error("expected {expected} to play but got {actual}")]
    OutOfTurn { expected: Seat, actual: Seat },
    #[error("{seat} does not hold card {card}")]
    NotInHand { seat: Seat, card: Card },
    #[error(transparent)]
    Trick(#[from] TrickError),
    #[error(transparent)]
    History(#[from] HistoryFull),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    RoundCompleted { record: RoundRecord },
}

/// Final result of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Winner(Seat),
    Draw,
}

/// Authoritative state of one 10-round match.
#[derive(Debug, Clone)]
pub struct MatchState {
    hands: [CardSet; 2],
    withheld: CardSet,
    history: PlayedHistory,
    scores: ScoreBoard,
    current: Trick,
    first_leader: Seat,
    seed: u64,
}

impl MatchState {
    pub fn new(first_leader: Seat) -> Self {
        let seed: u64 = rand::random();
        Self::with_seed(first_leader, seed)
    }

    pub fn with_seed(first_leader: Seat, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let deck = Deck::shuffled(&mut rng);
        let mut state = Self::from_deal(deck.deal(), first_leader);
        state.seed = seed;
        state
    }

    pub fn from_deal(deal: Deal, first_leader: Seat) -> Self {
        Self {
            hands: [deal.hand(Seat::North), deal.hand(Seat::South)],
            withheld: deal.withheld(),
            history: PlayedHistory::new(),
            scores: ScoreBoard::new(),
            current: Trick::new(first_leader),
            first_leader,
            seed: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn first_leader(&self) -> Seat {
        self.first_leader
    }

    pub fn hand(&self, seat: Seat) -> CardSet {
        self.hands[seat.index()]
    }

    pub fn withheld(&self) -> CardSet {
        self.withheld
    }

    pub fn history(&self) -> &PlayedHistory {
        &self.history
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current
    }

    /// 1-based number of the round being played.
    pub fn round_number(&self) -> usize {
        self.history.len() + 1
    }

    pub fn is_complete(&self) -> bool {
        self.history.len() == MAX_ROUNDS
    }

    pub fn expected_to_play(&self) -> Option<Seat> {
        if self.is_complete() {
            return None;
        }
        self.current.expected_seat()
    }

    pub fn result(&self) -> Option<MatchResult> {
        if !self.is_complete() {
            return None;
        }
        Some(match self.scores.leader() {
            Some(seat) => MatchResult::Winner(seat),
            None => MatchResult::Draw,
        })
    }

    pub fn play_card(&mut self, seat: Seat, card: Card) -> Result<PlayOutcome, PlayError> {
        let expected = self.expected_to_play().ok_or(PlayError::MatchComplete)?;
        if expected != seat {
            return Err(PlayError::OutOfTurn {
                expected,
                actual: seat,
            });
        }
        if !self.hand(seat).contains(card) {
            return Err(PlayError::NotInHand { seat, card });
        }

        self.current.play(seat, card)?;
        self.hands[seat.index()].remove(card);

        let Some(record) = self.current.record() else {
            return Ok(PlayOutcome::Played);
        };
        self.history.push(record)?;
        self.scores.add_point(record.winner);
        self.current = Trick::new(record.winner);
        Ok(PlayOutcome::RoundCompleted { record })
    }

    /// Snapshot of the match as `seat` sees it, ready for the decision engine.
    pub fn view_for(&self, seat: Seat) -> Result<GameState, StateError> {
        let lead = match self.current.led_card() {
            Some(card) if self.current.leader() != seat => Lead::Opponent(card),
            _ => Lead::Ai,
        };
        GameState::new(
            self.hand(seat),
            self.hand(seat.opponent()).len(),
            self.history.clone(),
            self.scores.score(seat),
            self.scores.score(seat.opponent()),
            lead,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{MatchState, PlayError, PlayOutcome};
    use crate::game::state::Lead;
    use crate::model::card::Card;
    use crate::model::card_set::CardSet;
    use crate::model::deck::Deal;
    use crate::model::seat::Seat;

    fn scripted() -> MatchState {
        let north = CardSet::from_values(&[1, 3, 5, 7, 9, 11, 13, 15, 17, 19]);
        let south = CardSet::from_values(&[2, 4, 6, 8, 10, 12, 14, 16, 18, 30]);
        MatchState::from_deal(Deal::from_hands(north, south), Seat::North)
    }

    #[test]
    fn seeded_deal_is_reproducible() {
        let a = MatchState::with_seed(Seat::South, 1234);
        let b = MatchState::with_seed(Seat::South, 1234);
        assert_eq!(a.hand(Seat::North), b.hand(Seat::North));
        assert_eq!(a.hand(Seat::South), b.hand(Seat::South));
        assert_eq!(a.seed(), 1234);
        assert_eq!(a.expected_to_play(), Some(Seat::South));
        assert_eq!(a.hand(Seat::North).len(), 10);
        assert_eq!(a.withheld().len(), 10);
    }

    #[test]
    fn rejects_out_of_turn_and_foreign_cards() {
        let mut state = scripted();
        let two = Card::new(2).unwrap();
        let one = Card::new(1).unwrap();
        assert_eq!(
            state.play_card(Seat::South, two),
            Err(PlayError::OutOfTurn {
                expected: Seat::North,
                actual: Seat::South
            })
        );
        assert_eq!(
            state.play_card(Seat::North, two),
            Err(PlayError::NotInHand {
                seat: Seat::North,
                card: two
            })
        );
        assert_eq!(state.play_card(Seat::North, one), Ok(PlayOutcome::Played));
    }

    #[test]
    fn winner_leads_next_round() {
        let mut state = scripted();
        let card = |v| Card::new(v).unwrap();
        state.play_card(Seat::North, card(9)).unwrap();
        let outcome = state.play_card(Seat::South, card(10)).unwrap();
        match outcome {
            PlayOutcome::RoundCompleted { record } => assert_eq!(record.winner, Seat::South),
            PlayOutcome::Played => panic!("round should be complete"),
        }
        assert_eq!(state.expected_to_play(), Some(Seat::South));
        assert_eq!(state.scores().score(Seat::South), 1);
        assert_eq!(state.round_number(), 2);
    }

    #[test]
    fn view_reports_revealed_lead() {
        let mut state = scripted();
        let card = |v| Card::new(v).unwrap();
        state.play_card(Seat::North, card(13)).unwrap();
        let view = state.view_for(Seat::South).unwrap();
        assert_eq!(view.lead(), Lead::Opponent(card(13)));
        assert_eq!(view.opponent_hand_size(), 9);
        assert!(!view.unknown_pool().contains(card(13)));
        assert!(view.unknown_pool().is_disjoint(state.hand(Seat::South)));
        assert!(state.hand(Seat::North).is_subset(view.unknown_pool()));
    }

    #[test]
    fn full_match_completes_with_a_result() {
        let mut state = scripted();
        while let Some(seat) = state.expected_to_play() {
            let card = state.hand(seat).min().unwrap();
            state.play_card(seat, card).unwrap();
        }
        assert!(state.is_complete());
        let total = state.scores().score(Seat::North) + state.scores().score(Seat::South);
        assert_eq!(total, 10);
        assert!(state.result().is_some());
        assert!(matches!(
            state.play_card(Seat::North, Card::new(1).unwrap()),
            Err(PlayError::MatchComplete)
        ));
    }
}
