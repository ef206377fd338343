use crate::model::seat::Seat;
use serde::{Deserialize, Serialize};

/// Points won per seat. One point per round taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    totals: [u32; 2],
}

impl ScoreBoard {
    pub const fn new() -> Self {
        Self { totals: [0; 2] }
    }

    pub fn add_point(&mut self, seat: Seat) {
        self.totals[seat.index()] += 1;
    }

    pub fn set_score(&mut self, seat: Seat, points: u32) {
        self.totals[seat.index()] = points;
    }

    pub fn score(&self, seat: Seat) -> u32 {
        self.totals[seat.index()]
    }

    pub fn standings(&self) -> &[u32; 2] {
        &self.totals
    }

    /// `seat`'s score minus its opponent's.
    pub fn differential(&self, seat: Seat) -> i32 {
        self.score(seat) as i32 - self.score(seat.opponent()) as i32
    }

    /// Seat with strictly more points, `None` on a tie.
    pub fn leader(&self) -> Option<Seat> {
        match self.differential(Seat::North) {
            d if d > 0 => Some(Seat::North),
            d if d < 0 => Some(Seat::South),
            _ => None,
        }
    }
}
