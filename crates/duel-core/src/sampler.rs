//! Opponent hand sampling.
//!
//! The engine never sees the opponent's cards. Instead it draws concrete hands uniformly from the
//! unknown pool and searches each of them as if it were the real deal.

use crate::model::card_set::CardSet;
use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SamplingError {
    #[error("cannot draw {requested} cards from a pool of {available}")]
    InsufficientPool { requested: usize, available: usize },
}

/// Counters accumulated across draws, reported alongside decisions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SamplingStats {
    pub draws: usize,
    pub cards_drawn: usize,
}

#[derive(Debug, Default)]
pub struct OpponentSampler;

impl OpponentSampler {
    /// Draws `size` distinct cards uniformly without replacement from `pool`.
    pub fn sample<R: Rng + ?Sized>(
        pool: CardSet,
        size: usize,
        rng: &mut R,
    ) -> Result<CardSet, SamplingError> {
        if pool.len() < size {
            return Err(SamplingError::InsufficientPool {
                requested: size,
                available: pool.len(),
            });
        }
        let candidates = pool.to_vec();
        Ok(candidates.choose_multiple(rng, size).copied().collect())
    }

    /// Draws `count` independent hands, all of `size` cards.
    pub fn sample_ensemble<R: Rng + ?Sized>(
        pool: CardSet,
        size: usize,
        count: usize,
        rng: &mut R,
        mut stats: Option<&mut SamplingStats>,
    ) -> Result<Vec<CardSet>, SamplingError> {
        let mut ensemble = Vec::with_capacity(count);
        for _ in 0..count {
            let hand = Self::sample(pool, size, rng)?;
            if let Some(inner) = stats.as_deref_mut() {
                inner.draws += 1;
                inner.cards_drawn += hand.len();
            }
            ensemble.push(hand);
        }
        Ok(ensemble)
    }
}
