//! One-shot placement of gold piles onto open room floor.

use std::collections::BTreeSet;

use nuggets_core::Tile;
use rand::Rng;
use thiserror::Error;

/// Reasons a gold population request cannot be satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PopulateError {
    /// The minimum pile count exceeds the maximum.
    #[error("minimum pile count {min_piles} exceeds maximum {max_piles}")]
    InvertedRange {
        /// Requested minimum.
        min_piles: u32,
        /// Requested maximum.
        max_piles: u32,
    },
    /// More piles were requested than there are nuggets to fill them.
    #[error("{max_piles} piles cannot each hold a nugget from a total of {gold_total}")]
    MorePilesThanGold {
        /// Requested maximum.
        max_piles: u32,
        /// Gold to distribute.
        gold_total: u32,
    },
    /// The map has fewer open room spots than the maximum pile count.
    #[error("map has {room_spots} open room spots but up to {max_piles} piles were requested")]
    NotEnoughRoom {
        /// Requested maximum.
        max_piles: u32,
        /// Open room spots available on the map.
        room_spots: usize,
    },
    /// Gold was requested but the pile range allows zero piles.
    #[error("cannot place {gold_total} gold in zero piles")]
    ZeroPiles {
        /// Gold to distribute.
        gold_total: u32,
    },
}

/// Gold assigned to a single cell, addressed by row-major index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Placement {
    pub(crate) index: usize,
    pub(crate) amount: u32,
}

/// Converts a gold total and a pile-count range into concrete placements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoldDistributor {
    min_piles: u32,
    max_piles: u32,
    gold_total: u32,
}

impl GoldDistributor {
    /// Creates a distributor for `gold_total` nuggets spread over `min_piles..=max_piles` piles.
    #[must_use]
    pub const fn new(min_piles: u32, max_piles: u32, gold_total: u32) -> Self {
        Self {
            min_piles,
            max_piles,
            gold_total,
        }
    }

    /// Checks the request against the number of open room spots on the map.
    pub fn validate(&self, room_spots: usize) -> Result<(), PopulateError> {
        if self.min_piles > self.max_piles {
            return Err(PopulateError::InvertedRange {
                min_piles: self.min_piles,
                max_piles: self.max_piles,
            });
        }
        if self.max_piles > self.gold_total {
            return Err(PopulateError::MorePilesThanGold {
                max_piles: self.max_piles,
                gold_total: self.gold_total,
            });
        }
        if usize::try_from(self.max_piles).map_or(true, |max| room_spots < max) {
            return Err(PopulateError::NotEnoughRoom {
                max_piles: self.max_piles,
                room_spots,
            });
        }
        if self.min_piles == 0 && self.gold_total > 0 {
            return Err(PopulateError::ZeroPiles {
                gold_total: self.gold_total,
            });
        }
        Ok(())
    }

    /// Chooses pile cells among the `Room` tiles of `cells` and splits the gold between them.
    ///
    /// Pile cells are found by rejection sampling over every cell index; validation
    /// guarantees enough room spots exist for this to terminate. Each pile receives one
    /// nugget up front and the rest are dealt one at a time to uniformly drawn piles.
    /// The up-front nugget departs from a pure multinomial deal so that no chosen pile is empty.
    pub(crate) fn place<R: Rng + ?Sized>(
        &self,
        cells: &[Tile],
        rng: &mut R,
    ) -> Result<Vec<Placement>, PopulateError> {
        let room_spots = cells.iter().filter(|tile| **tile == Tile::Room).count();
        self.validate(room_spots)?;

        let pile_count = rng.gen_range(self.min_piles..=self.max_piles) as usize;
        if pile_count == 0 {
            return Ok(Vec::new());
        }

        let mut chosen = BTreeSet::new();
        let mut piles: Vec<Placement> = Vec::with_capacity(pile_count);
        while piles.len() < pile_count {
            let index = rng.gen_range(0..cells.len());
            if cells[index] == Tile::Room && chosen.insert(index) {
                piles.push(Placement { index, amount: 1 });
            }
        }

        let remainder = self.gold_total - pile_count as u32;
        for _ in 0..remainder {
            let pile = rng.gen_range(0..piles.len());
            piles[pile].amount += 1;
        }

        Ok(piles)
    }
}
