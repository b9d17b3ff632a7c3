#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Nuggets engine.
//!
//! This crate defines the message surface that connects the protocol adapter,
//! the authoritative map grid, the visibility system and the game coordinator.
//! Adapters translate wire traffic into [`Action`] values addressed by a
//! [`ClientId`], the coordinator resolves each action to completion against
//! the grid, and then hands back [`Outbound`] messages for the adapter to
//! deliver. Nothing in here knows about sockets or text framing.

use serde::{Deserialize, Serialize};

/// Hard upper bound on the number of players, one per letter `A..=Z`.
pub const MAX_PLAYERS: usize = 26;

/// Symbol a player sees in place of their own letter.
pub const SELF_SYMBOL: char = '@';

/// Classification of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// Unmapped space; reported for coordinates outside the grid.
    Void,
    /// Solid rock between rooms and passages.
    Rock,
    /// Horizontal room boundary.
    HorizontalWall,
    /// Vertical room boundary.
    VerticalWall,
    /// Corner where two room boundaries meet.
    Corner,
    /// Open floor inside a room.
    Room,
    /// Corridor floor connecting rooms.
    Passage,
    /// Floor holding a pile of gold nuggets.
    Gold,
    /// Floor occupied by the player with the given letter.
    Player(PlayerLetter),
}

impl Tile {
    /// Parses a map symbol into its tile, if the symbol belongs to the alphabet.
    #[must_use]
    pub fn from_symbol(symbol: char) -> Option<Self> {
        let tile = match symbol {
            ' ' => Self::Rock,
            '-' => Self::HorizontalWall,
            '|' => Self::VerticalWall,
            '+' => Self::Corner,
            '.' => Self::Room,
            '#' => Self::Passage,
            '*' => Self::Gold,
            other => return PlayerLetter::from_symbol(other).map(Self::Player),
        };
        Some(tile)
    }

    /// Symbol used when rendering the tile as map text.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Void | Self::Rock => ' ',
            Self::HorizontalWall => '-',
            Self::VerticalWall => '|',
            Self::Corner => '+',
            Self::Room => '.',
            Self::Passage => '#',
            Self::Gold => '*',
            Self::Player(letter) => letter.symbol(),
        }
    }

    /// Reports whether the tile belongs to the terrain a map file may contain.
    #[must_use]
    pub const fn is_base_terrain(self) -> bool {
        !matches!(self, Self::Void | Self::Gold | Self::Player(_))
    }

    /// Reports whether the tile can never be entered by a player.
    #[must_use]
    pub const fn is_obstacle(self) -> bool {
        matches!(
            self,
            Self::Void | Self::Rock | Self::HorizontalWall | Self::VerticalWall | Self::Corner
        )
    }

    /// Reports whether the tile stops a line of sight passing through it.
    ///
    /// Passages are opaque so that players in corridors only see adjacent cells.
    #[must_use]
    pub const fn blocks_sight(self) -> bool {
        self.is_obstacle() || matches!(self, Self::Passage)
    }
}

/// Letter identifying a player on the shared grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerLetter(u8);

impl PlayerLetter {
    /// Returns the letter for a zero-based join index, if one exists.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index)
            .ok()
            .filter(|value| usize::from(*value) < MAX_PLAYERS)
            .map(Self)
    }

    /// Parses an uppercase ASCII letter.
    #[must_use]
    pub fn from_symbol(symbol: char) -> Option<Self> {
        if symbol.is_ascii_uppercase() {
            Some(Self(symbol as u8 - b'A'))
        } else {
            None
        }
    }

    /// Zero-based offset of the letter from `A`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Uppercase character shown to other players.
    #[must_use]
    pub const fn symbol(self) -> char {
        (b'A' + self.0) as char
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell (the `x` coordinate).
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell (the `y` coordinate).
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Applies a step, returning `None` when it would leave the non-negative quadrant.
    ///
    /// Upper bounds are the grid's concern.
    #[must_use]
    pub fn offset(self, step: Step) -> Option<Self> {
        let column = self.column.checked_add_signed(step.dx())?;
        let row = self.row.checked_add_signed(step.dy())?;
        Some(Self::new(column, row))
    }
}

/// Unit movement toward one of the eight neighbouring cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    dx: i8,
    dy: i8,
}

impl Step {
    /// Toward decreasing columns.
    pub const LEFT: Self = Self { dx: -1, dy: 0 };
    /// Toward increasing columns.
    pub const RIGHT: Self = Self { dx: 1, dy: 0 };
    /// Toward decreasing rows.
    pub const UP: Self = Self { dx: 0, dy: -1 };
    /// Toward increasing rows.
    pub const DOWN: Self = Self { dx: 0, dy: 1 };
    /// Diagonally up and left.
    pub const UP_LEFT: Self = Self { dx: -1, dy: -1 };
    /// Diagonally up and right.
    pub const UP_RIGHT: Self = Self { dx: 1, dy: -1 };
    /// Diagonally down and left.
    pub const DOWN_LEFT: Self = Self { dx: -1, dy: 1 };
    /// Diagonally down and right.
    pub const DOWN_RIGHT: Self = Self { dx: 1, dy: 1 };

    /// Creates a step from raw deltas.
    ///
    /// Returns `None` unless both deltas lie in `-1..=1` and at least one is non-zero.
    #[must_use]
    pub fn new(dx: i32, dy: i32) -> Option<Self> {
        let in_range = (-1..=1).contains(&dx) && (-1..=1).contains(&dy);
        if !in_range || (dx == 0 && dy == 0) {
            return None;
        }
        Some(Self {
            dx: dx as i8,
            dy: dy as i8,
        })
    }

    /// Column delta.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx as i32
    }

    /// Row delta.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.dy as i32
    }
}

/// Opaque identity of a remote peer, assigned by the transport adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(u64);

impl ClientId {
    /// Creates a new client identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Requests a client may submit to the game coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Requests to join the game as a player.
    Join {
        /// Display name supplied by the client.
        name: String,
    },
    /// Requests a single step in the given direction.
    Move {
        /// Direction of travel.
        step: Step,
    },
    /// Requests repeated steps in one direction until blocked.
    Slide {
        /// Direction of travel.
        step: Step,
    },
    /// Requests to watch the game as the spectator.
    Spectate,
    /// Announces that the client is leaving.
    Leave,
}

/// Final standing of one player, reported at game over.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    /// Letter the player held.
    pub letter: PlayerLetter,
    /// Gold the player collected.
    pub purse: u32,
    /// Name the player joined with.
    pub name: String,
}

/// Messages the coordinator emits for delivery to a single client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// Confirms a join and reports the assigned letter.
    JoinAccepted {
        /// Letter assigned to the new player.
        letter: PlayerLetter,
    },
    /// Reports the dimensions of the map.
    GridDimensions {
        /// Number of rows in the map.
        rows: u32,
        /// Number of columns in the map.
        columns: u32,
    },
    /// Reports gold totals personalised for the recipient.
    GoldStatus {
        /// Gold the recipient collected in the action that triggered the message.
        collected: u32,
        /// Gold the recipient holds.
        purse: u32,
        /// Gold still lying on the map.
        remaining: u32,
    },
    /// Carries the recipient's rendered view of the map.
    Display {
        /// Map text, one newline-terminated line per row.
        text: String,
    },
    /// Announces the end of the game with every player's result.
    GameOver {
        /// Results in join order.
        summary: Vec<SummaryLine>,
    },
    /// Reports a recoverable problem with the client's request.
    Error {
        /// Human-readable explanation.
        reason: String,
    },
    /// Refuses a join request.
    JoinRejected {
        /// Human-readable explanation.
        reason: String,
    },
    /// Tells the client its session has ended.
    Quit {
        /// Human-readable explanation.
        reason: String,
    },
}

/// A message paired with the client that should receive it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    /// Recipient of the message.
    pub to: ClientId,
    /// Payload to deliver.
    pub message: Message,
}

impl Outbound {
    /// Addresses a message to a client.
    #[must_use]
    pub const fn new(to: ClientId, message: Message) -> Self {
        Self { to, message }
    }
}

/// Tunable parameters for a single game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Maximum number of players; values above [`MAX_PLAYERS`] are clamped.
    pub max_players: usize,
    /// Total gold scattered on the map.
    pub gold_total: u32,
    /// Fewest gold piles to create.
    pub min_piles: u32,
    /// Most gold piles to create.
    pub max_piles: u32,
    /// Longest player name kept, in characters.
    pub max_name_length: usize,
    /// Seed for deterministic games; entropy is used when absent.
    pub seed: Option<u64>,
}

impl GameConfig {
    /// Player capacity after clamping to the letter range.
    #[must_use]
    pub fn player_capacity(&self) -> usize {
        self.max_players.min(MAX_PLAYERS)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_players: MAX_PLAYERS,
            gold_total: 250,
            min_piles: 10,
            max_piles: 30,
            max_name_length: 50,
            seed: None,
        }
    }
}
