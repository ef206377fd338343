//! Compact set of cards backed by a 30-bit mask.
//!
//! Hands, the unknown pool, and sampled opponent hands are all `CardSet`s. Iteration is ordered by
//! card value, ascending by default.

use crate::model::card::Card;
use core::fmt;
use core::iter::Rev;
use serde::{Deserialize, Serialize};

const FULL_MASK: u32 = (1u32 << Card::COUNT) - 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Card>", into = "Vec<Card>")]
pub struct CardSet {
    bits: u32,
}

impl CardSet {
    pub const EMPTY: CardSet = CardSet { bits: 0 };
    pub const FULL_DECK: CardSet = CardSet { bits: FULL_MASK };

    pub const fn new() -> Self {
        Self::EMPTY
    }

    pub fn with_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut set = Self::new();
        for card in cards {
            set.add(card);
        }
        set
    }

    /// Builds a set from raw values, silently skipping anything outside 1..=30.
    pub fn from_values(values: &[u8]) -> Self {
        Self::with_cards(values.iter().copied().filter_map(Card::new))
    }

    /// Adds a card, returning false when it was already present.
    pub fn add(&mut self, card: Card) -> bool {
        let fresh = !self.contains(card);
        self.bits |= card.bit();
        fresh
    }

    pub fn remove(&mut self, card: Card) -> bool {
        let present = self.contains(card);
        self.bits &= !card.bit();
        present
    }

    pub const fn contains(&self, card: Card) -> bool {
        self.bits & card.bit() != 0
    }

    pub const fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Returns a copy with `card` removed.
    pub fn without(self, card: Card) -> Self {
        Self {
            bits: self.bits & !card.bit(),
        }
    }

    pub const fn union(self, other: CardSet) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    pub const fn intersection(self, other: CardSet) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    pub const fn difference(self, other: CardSet) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    pub const fn is_disjoint(self, other: CardSet) -> bool {
        self.bits & other.bits == 0
    }

    pub const fn is_subset(self, other: CardSet) -> bool {
        self.bits & !other.bits == 0
    }

    pub fn min(&self) -> Option<Card> {
        if self.is_empty() {
            return None;
        }
        Card::new(self.bits.trailing_zeros() as u8 + 1)
    }

    pub fn max(&self) -> Option<Card> {
        if self.is_empty() {
            return None;
        }
        Card::new(32 - self.bits.leading_zeros() as u8)
    }

    /// Difference between the highest and lowest card, zero for fewer than two cards.
    pub fn spread(&self) -> u8 {
        match (self.min(), self.max()) {
            (Some(low), Some(high)) => high.value() - low.value(),
            _ => 0,
        }
    }

    pub fn total_value(&self) -> u32 {
        self.iter().map(|card| u32::from(card.value())).sum()
    }

    pub fn count_high(&self) -> usize {
        self.iter().filter(|card| card.is_high()).count()
    }

    pub fn count_top(&self) -> usize {
        self.iter().filter(|card| card.is_top()).count()
    }

    /// Lowest card strictly greater than `card`, if any.
    pub fn lowest_above(&self, card: Card) -> Option<Card> {
        self.iter().find(|candidate| candidate.beats(card))
    }

    /// Cards in ascending order.
    pub fn iter(&self) -> CardSetIter {
        CardSetIter { bits: self.bits }
    }

    /// Cards in descending order.
    pub fn iter_desc(&self) -> Rev<CardSetIter> {
        self.iter().rev()
    }

    pub fn to_vec(&self) -> Vec<Card> {
        self.iter().collect()
    }
}

impl FromIterator<Card> for CardSet {
    fn from_iter<T: IntoIterator<Item = Card>>(iter: T) -> Self {
        Self::with_cards(iter)
    }
}

impl From<Vec<Card>> for CardSet {
    fn from(cards: Vec<Card>) -> Self {
        Self::with_cards(cards)
    }
}

impl From<CardSet> for Vec<Card> {
    fn from(set: CardSet) -> Self {
        set.to_vec()
    }
}

impl IntoIterator for CardSet {
    type Item = Card;
    type IntoIter = CardSetIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for CardSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, card) in self.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{card}")?;
        }
        f.write_str("]")
    }
}

#[derive(Debug, Clone)]
pub struct CardSetIter {
    bits: u32,
}

impl Iterator for CardSetIter {
    type Item = Card;

    fn next(&mut self) -> Option<Card> {
        if self.bits == 0 {
            return None;
        }
        let index = self.bits.trailing_zeros();
        self.bits &= self.bits - 1;
        Card::new(index as u8 + 1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bits.count_ones() as usize;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for CardSetIter {
    fn next_back(&mut self) -> Option<Card> {
        if self.bits == 0 {
            return None;
        }
        let index = 31 - self.bits.leading_zeros();
        self.bits &= !(1u32 << index);
        Card::new(index as u8 + 1)
    }
}

impl ExactSizeIterator for CardSetIter {}
