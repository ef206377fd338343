use core::fmt;
use serde::{Deserialize, Serialize};

/// Cards strictly above this value count as high cards.
pub const HIGH_CARD_THRESHOLD: u8 = 20;

/// Cards strictly above this value count as top cards.
pub const TOP_CARD_THRESHOLD: u8 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Card(u8);

impl Card {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 30;
    pub const COUNT: usize = Self::MAX as usize;

    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN && value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn is_high(self) -> bool {
        self.0 > HIGH_CARD_THRESHOLD
    }

    pub const fn is_top(self) -> bool {
        self.0 > TOP_CARD_THRESHOLD
    }

    /// Returns true when `self` takes the round against `other`.
    pub fn beats(self, other: Card) -> bool {
        self.0 > other.0
    }

    pub fn all() -> impl DoubleEndedIterator<Item = Card> {
        (Self::MIN..=Self::MAX).map(Card)
    }

    pub(crate) const fn bit(self) -> u32 {
        1u32 << (self.0 - 1)
    }
}

impl TryFrom<u8> for Card {
    type Error = InvalidCard;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Card::new(value).ok_or(InvalidCard(value))
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> Self {
        card.0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("card value {0} is outside 1..=30")]
pub struct InvalidCard(pub u8);
