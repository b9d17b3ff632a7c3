//! Bookkeeping of the terrain hidden beneath each player's letter.

use nuggets_core::{PlayerLetter, Tile, MAX_PLAYERS};

/// Fixed table mapping each letter to the tile its cell held before the player arrived.
///
/// An entry exists exactly while that letter occupies a cell on the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StandingOn {
    slots: [Option<Tile>; MAX_PLAYERS],
}

impl StandingOn {
    pub(crate) const fn new() -> Self {
        Self {
            slots: [None; MAX_PLAYERS],
        }
    }

    pub(crate) fn get(&self, letter: PlayerLetter) -> Option<Tile> {
        self.slots[letter.index()]
    }

    pub(crate) fn contains(&self, letter: PlayerLetter) -> bool {
        self.get(letter).is_some()
    }

    /// Records the tile beneath `letter`, returning the previous record.
    pub(crate) fn replace(&mut self, letter: PlayerLetter, beneath: Tile) -> Option<Tile> {
        self.slots[letter.index()].replace(beneath)
    }

    pub(crate) fn take(&mut self, letter: PlayerLetter) -> Option<Tile> {
        self.slots[letter.index()].take()
    }

    pub(crate) fn swap(&mut self, first: PlayerLetter, second: PlayerLetter) {
        self.slots.swap(first.index(), second.index());
    }

    pub(crate) fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
