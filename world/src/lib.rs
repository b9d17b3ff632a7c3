#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative map grid for Nuggets.
//!
//! The [`MapGrid`] owns the terrain loaded from a map file, the gold piles
//! scattered over it and the record of what each player is standing on. It
//! knows nothing about player records or messages; the game coordinator drives
//! it one mutation at a time.

mod gold;
mod occupancy;

use std::collections::BTreeMap;

use nuggets_core::{CellCoord, PlayerLetter, Step, Tile};
use rand::Rng;
use thiserror::Error;
use tracing::debug;

pub use gold::{GoldDistributor, PopulateError};
use occupancy::StandingOn;

const SPAWN_ATTEMPTS: usize = 100;

/// Reasons a map source cannot be turned into a grid.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MapLoadError {
    /// The source contained no cells.
    #[error("map is empty")]
    Empty,
    /// A row differs in length from the first row.
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A character outside the terrain alphabet was found.
    #[error("unknown map symbol {symbol:?} at row {row}, column {column}")]
    UnknownSymbol {
        /// Zero-based row of the symbol.
        row: usize,
        /// Zero-based column of the symbol.
        column: usize,
        /// The offending character.
        symbol: char,
    },
    /// The map is too large to address.
    #[error("map dimensions exceed the addressable range")]
    TooLarge,
}

/// Result of asking the grid to move a player one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveResult {
    /// The step leaves the map or runs into rock or a boundary; nothing changed.
    Blocked,
    /// Another player holds the destination; nothing changed yet.
    SwapNeeded {
        /// Letter of the player in the way.
        other: PlayerLetter,
        /// Cell holding that player.
        at: CellCoord,
    },
    /// The player now occupies `to`, having picked up `gold` nuggets there.
    Moved {
        /// Cell the player moved into.
        to: CellCoord,
        /// Gold collected on arrival.
        gold: u32,
    },
}

/// Fixed-size grid of tiles with gold and occupancy bookkeeping.
#[derive(Clone, Debug)]
pub struct MapGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Tile>,
    nuggets: BTreeMap<usize, u32>,
    standing_on: StandingOn,
}

impl MapGrid {
    /// Parses a rectangular block of map text.
    ///
    /// Both `\n` and `\r\n` line endings are accepted, as is a missing final newline.
    pub fn load(text: &str) -> Result<Self, MapLoadError> {
        let mut cells = Vec::new();
        let mut width: Option<usize> = None;
        let mut row_count = 0usize;

        for (row, line) in text.lines().enumerate() {
            let found = line.chars().count();
            let expected = *width.get_or_insert(found);
            if found != expected {
                return Err(MapLoadError::Ragged {
                    row,
                    expected,
                    found,
                });
            }
            for (column, symbol) in line.chars().enumerate() {
                match Tile::from_symbol(symbol) {
                    Some(tile) if tile.is_base_terrain() => cells.push(tile),
                    _ => {
                        return Err(MapLoadError::UnknownSymbol {
                            row,
                            column,
                            symbol,
                        })
                    }
                }
            }
            row_count += 1;
        }

        if cells.is_empty() {
            return Err(MapLoadError::Empty);
        }
        let columns = width
            .and_then(|width| u32::try_from(width).ok())
            .ok_or(MapLoadError::TooLarge)?;
        let rows = u32::try_from(row_count).map_err(|_| MapLoadError::TooLarge)?;

        Ok(Self {
            columns,
            rows,
            cells,
            nuggets: BTreeMap::new(),
            standing_on: StandingOn::new(),
        })
    }

    /// Number of columns in every row.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the coordinate lies on the grid.
    #[must_use]
    pub const fn is_valid_coordinate(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Tile currently shown at `cell`, or [`Tile::Void`] off the grid.
    #[must_use]
    pub fn tile_at(&self, cell: CellCoord) -> Tile {
        self.index(cell)
            .map_or(Tile::Void, |index| self.cells[index])
    }

    /// Terrain beneath any player or gold at `cell`.
    ///
    /// Intended for building views only; occupancy logic must use [`MapGrid::tile_at`].
    #[must_use]
    pub fn base_tile_at(&self, cell: CellCoord) -> Tile {
        match self.tile_at(cell) {
            Tile::Gold => Tile::Room,
            Tile::Player(letter) => self.standing_on.get(letter).unwrap_or(Tile::Room),
            tile => tile,
        }
    }

    /// Gold lying at `cell`.
    #[must_use]
    pub fn gold_at(&self, cell: CellCoord) -> u32 {
        self.index(cell)
            .and_then(|index| self.nuggets.get(&index).copied())
            .unwrap_or(0)
    }

    /// Gold lying anywhere on the grid.
    #[must_use]
    pub fn total_gold(&self) -> u32 {
        self.nuggets.values().sum()
    }

    /// Number of gold piles on the grid.
    #[must_use]
    pub fn pile_count(&self) -> usize {
        self.nuggets.len()
    }

    /// Number of unoccupied, gold-free room cells.
    #[must_use]
    pub fn room_spots(&self) -> usize {
        self.cells.iter().filter(|tile| **tile == Tile::Room).count()
    }

    /// Number of players currently on the grid.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.standing_on.occupied()
    }

    /// Terrain recorded beneath `letter`, if that player is on the grid.
    #[must_use]
    pub fn standing_on(&self, letter: PlayerLetter) -> Option<Tile> {
        self.standing_on.get(letter)
    }

    /// Places `letter` on an open room cell.
    ///
    /// Fails when the cell is anything other than unoccupied room floor or the
    /// letter is already on the grid.
    pub fn add_player(&mut self, cell: CellCoord, letter: PlayerLetter) -> bool {
        let Some(index) = self.index(cell) else {
            return false;
        };
        if self.cells[index] != Tile::Room || self.standing_on.contains(letter) {
            return false;
        }
        let _ = self.standing_on.replace(letter, Tile::Room);
        self.cells[index] = Tile::Player(letter);
        true
    }

    /// Picks a random open room cell for a new player.
    ///
    /// Tries a bounded number of uniform draws before falling back to a full
    /// scan, so it returns `None` only when no room cell is free.
    pub fn find_random_spawn_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<CellCoord> {
        for _ in 0..SPAWN_ATTEMPTS {
            let cell = CellCoord::new(
                rng.gen_range(0..self.columns),
                rng.gen_range(0..self.rows),
            );
            if self.tile_at(cell) == Tile::Room {
                return Some(cell);
            }
        }

        let open: Vec<usize> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile == Tile::Room)
            .map(|(index, _)| index)
            .collect();
        if open.is_empty() {
            return None;
        }
        let index = open[rng.gen_range(0..open.len())];
        Some(self.coord_of(index))
    }

    /// Moves the player at `from` one step.
    ///
    /// Gold at the destination is collected and the destination becomes room
    /// floor beneath the player. A destination held by another player is left
    /// untouched and reported as [`MoveResult::SwapNeeded`].
    pub fn move_player(&mut self, from: CellCoord, step: Step) -> MoveResult {
        let Tile::Player(letter) = self.tile_at(from) else {
            return MoveResult::Blocked;
        };
        let Some(to) = from.offset(step).filter(|cell| self.is_valid_coordinate(*cell)) else {
            return MoveResult::Blocked;
        };

        let (gold, beneath) = match self.tile_at(to) {
            Tile::Player(other) => return MoveResult::SwapNeeded { other, at: to },
            Tile::Gold => (self.collect_gold(to), Tile::Room),
            tile if tile.is_obstacle() => return MoveResult::Blocked,
            tile => (0, tile),
        };

        let previous = self.standing_on.replace(letter, beneath);
        self.set_tile(from, previous.unwrap_or(Tile::Room));
        self.set_tile(to, Tile::Player(letter));
        MoveResult::Moved { to, gold }
    }

    /// Exchanges the players at two cells together with what each stands on.
    ///
    /// Does nothing unless both cells hold players.
    pub fn swap_players(&mut self, first: CellCoord, second: CellCoord) {
        let (Tile::Player(a), Tile::Player(b)) = (self.tile_at(first), self.tile_at(second)) else {
            return;
        };
        self.standing_on.swap(a, b);
        self.set_tile(first, Tile::Player(b));
        self.set_tile(second, Tile::Player(a));
    }

    /// Takes `letter` off the grid, restoring the terrain it stood on.
    pub fn remove_player(&mut self, letter: PlayerLetter, cell: CellCoord) -> bool {
        if self.tile_at(cell) != Tile::Player(letter) {
            return false;
        }
        let beneath = self.standing_on.take(letter).unwrap_or(Tile::Room);
        self.set_tile(cell, beneath);
        true
    }

    /// Removes and returns the gold at `cell`; the tile itself is left as is.
    pub fn collect_gold(&mut self, cell: CellCoord) -> u32 {
        self.index(cell)
            .and_then(|index| self.nuggets.remove(&index))
            .unwrap_or(0)
    }

    /// Scatters `gold_total` nuggets over `min_piles..=max_piles` random room cells.
    pub fn nuggets_populate<R: Rng + ?Sized>(
        &mut self,
        min_piles: u32,
        max_piles: u32,
        gold_total: u32,
        rng: &mut R,
    ) -> Result<(), PopulateError> {
        let placements =
            GoldDistributor::new(min_piles, max_piles, gold_total).place(&self.cells, rng)?;
        debug!(piles = placements.len(), gold_total, "gold placed");
        for placement in placements {
            self.cells[placement.index] = Tile::Gold;
            let _ = self.nuggets.insert(placement.index, placement.amount);
        }
        Ok(())
    }

    /// Renders the grid as text, every row followed by a newline.
    #[must_use]
    pub fn display(&self) -> String {
        let width = self.columns as usize;
        let mut text = String::with_capacity(self.cells.len() + self.rows as usize);
        for row in self.cells.chunks(width) {
            text.extend(row.iter().map(|tile| tile.symbol()));
            text.push('\n');
        }
        text
    }

    fn set_tile(&mut self, cell: CellCoord, tile: Tile) {
        if let Some(index) = self.index(cell) {
            self.cells[index] = tile;
        }
    }

    fn coord_of(&self, index: usize) -> CellCoord {
        let width = self.columns as usize;
        CellCoord::new((index % width) as u32, (index / width) as u32)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.is_valid_coordinate(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
