#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Line-of-sight system deriving each player's private view of the map.
//!
//! Sight lines are traced with exact integer arithmetic. A line is swept once
//! column by column and once row by row; at every interior step the crossing
//! point is either exactly on a cell, which must be transparent, or between two
//! cells, which blocks only when both flanking cells are opaque.

use nuggets_core::{CellCoord, Tile, SELF_SYMBOL};
use nuggets_world::MapGrid;

/// Reports whether `target` can be seen from `viewer`.
#[must_use]
pub fn is_visible(grid: &MapGrid, viewer: CellCoord, target: CellCoord) -> bool {
    let (px, py) = (i64::from(viewer.column()), i64::from(viewer.row()));
    let (x, y) = (i64::from(target.column()), i64::from(target.row()));

    let column_sweep = sweep_blocked((px, py), (x, y), |primary, secondary| {
        blocks_sight(grid, primary, secondary)
    });
    if column_sweep {
        return false;
    }
    !sweep_blocked((py, px), (y, x), |primary, secondary| {
        blocks_sight(grid, secondary, primary)
    })
}

/// Walks the primary axis strictly between the endpoints, asking `blocked`
/// about the cells the line crosses on the secondary axis.
fn sweep_blocked<F>(from: (i64, i64), to: (i64, i64), blocked: F) -> bool
where
    F: Fn(i64, i64) -> bool,
{
    let (primary_from, secondary_from) = from;
    let (primary_to, secondary_to) = to;
    if primary_from == primary_to {
        return false;
    }

    let direction = (primary_to - primary_from).signum();
    let denominator = (primary_to - primary_from).abs();
    let rise = secondary_to - secondary_from;

    let mut primary = primary_from + direction;
    while primary != primary_to {
        let numerator = (primary - primary_from) * rise * direction;
        let whole = numerator.div_euclid(denominator);
        let secondary = secondary_from + whole;
        let crossed = if numerator.rem_euclid(denominator) == 0 {
            blocked(primary, secondary)
        } else {
            blocked(primary, secondary) && blocked(primary, secondary + 1)
        };
        if crossed {
            return true;
        }
        primary += direction;
    }
    false
}

/// Gold and players never block, even where a player stands in a passage.
fn blocks_sight(grid: &MapGrid, column: i64, row: i64) -> bool {
    match (u32::try_from(column), u32::try_from(row)) {
        (Ok(column), Ok(row)) => grid.tile_at(CellCoord::new(column, row)).blocks_sight(),
        _ => true,
    }
}

/// A player's private view: terrain remembered from earlier sightings plus
/// whatever is currently in line of sight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibleGrid {
    columns: u32,
    rows: u32,
    remembered: Vec<Option<Tile>>,
    in_sight: Vec<Option<Tile>>,
    viewer: Option<CellCoord>,
}

impl VisibleGrid {
    /// Creates a view of the given size in which nothing has been seen.
    #[must_use]
    pub fn unseen(columns: u32, rows: u32) -> Self {
        let capacity = columns as usize * rows as usize;
        Self {
            columns,
            rows,
            remembered: vec![None; capacity],
            in_sight: vec![None; capacity],
            viewer: None,
        }
    }

    /// Number of columns covered by the view.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows covered by the view.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Position the view was last computed from.
    #[must_use]
    pub const fn viewer(&self) -> Option<CellCoord> {
        self.viewer
    }

    /// Base terrain seen at `cell` at any point so far.
    #[must_use]
    pub fn remembered(&self, cell: CellCoord) -> Option<Tile> {
        self.index(cell).and_then(|index| self.remembered[index])
    }

    /// Reports whether `cell` was in line of sight at the last refresh.
    #[must_use]
    pub fn is_in_sight(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .map_or(false, |index| self.in_sight[index].is_some())
    }

    /// Recomputes the view from `viewer` against the current state of `grid`.
    ///
    /// Cells in sight record their base terrain permanently and show their
    /// live contents until the next refresh; cells out of sight keep whatever
    /// terrain was remembered.
    pub fn refresh(&mut self, grid: &MapGrid, viewer: CellCoord) {
        if (self.columns, self.rows) != (grid.columns(), grid.rows()) {
            *self = Self::unseen(grid.columns(), grid.rows());
        }
        self.viewer = Some(viewer);

        for row in 0..self.rows {
            for column in 0..self.columns {
                let cell = CellCoord::new(column, row);
                let index = row as usize * self.columns as usize + column as usize;
                if cell == viewer {
                    self.remembered[index] = Some(grid.base_tile_at(cell));
                    self.in_sight[index] = None;
                } else if is_visible(grid, viewer, cell) {
                    self.remembered[index] = Some(grid.base_tile_at(cell));
                    self.in_sight[index] = Some(grid.tile_at(cell));
                } else {
                    self.in_sight[index] = None;
                }
            }
        }
    }

    /// Symbol shown at `cell`: the self marker, live contents, remembered
    /// terrain, or blank when never seen.
    #[must_use]
    pub fn symbol_at(&self, cell: CellCoord) -> char {
        if self.viewer == Some(cell) {
            return SELF_SYMBOL;
        }
        let Some(index) = self.index(cell) else {
            return Tile::Void.symbol();
        };
        self.in_sight[index]
            .or(self.remembered[index])
            .map_or(Tile::Void.symbol(), Tile::symbol)
    }

    /// Renders the view as map text, one newline-terminated line per row.
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = String::with_capacity(self.remembered.len() + self.rows as usize);
        for row in 0..self.rows {
            text.extend(
                (0..self.columns).map(|column| self.symbol_at(CellCoord::new(column, row))),
            );
            text.push('\n');
        }
        text
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            Some(cell.row() as usize * self.columns as usize + cell.column() as usize)
        } else {
            None
        }
    }
}

/// Produces the view from `viewer`, carrying memory over from `previous`.
///
/// Without a previous snapshot every cell starts unseen.
#[must_use]
pub fn generate_visible_grid(
    grid: &MapGrid,
    previous: Option<VisibleGrid>,
    viewer: CellCoord,
) -> VisibleGrid {
    let mut view =
        previous.unwrap_or_else(|| VisibleGrid::unseen(grid.columns(), grid.rows()));
    view.refresh(grid, viewer);
    view
}
