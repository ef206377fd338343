use crate::model::card::Card;
use crate::model::card_set::CardSet;
use crate::model::seat::Seat;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub const HAND_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn standard() -> Self {
        Self {
            cards: Card::all().collect(),
        }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Splits the deck in order: the first ten cards go to North, the next ten to South and the
    /// remaining ten are withheld from both seats.
    pub fn deal(&self) -> Deal {
        let mut chunks = self.cards.chunks(HAND_SIZE);
        let mut next_chunk = || CardSet::with_cards(chunks.next().unwrap_or_default().iter().copied());
        let north = next_chunk();
        let south = next_chunk();
        let withheld = next_chunk();
        Deal {
            hands: [north, south],
            withheld,
        }
    }
}

/// Initial partition of the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deal {
    hands: [CardSet; 2],
    withheld: CardSet,
}

impl Deal {
    pub fn from_hands(north: CardSet, south: CardSet) -> Self {
        let withheld = CardSet::FULL_DECK.difference(north.union(south));
        Self {
            hands: [north, south],
            withheld,
        }
    }

    pub fn hand(&self, seat: Seat) -> CardSet {
        self.hands[seat.index()]
    }

    pub fn withheld(&self) -> CardSet {
        self.withheld
    }
}
