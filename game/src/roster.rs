//! Player records held by the coordinator.

use nuggets_core::{CellCoord, ClientId, PlayerLetter, SummaryLine};
use nuggets_system_visibility::VisibleGrid;

/// A participant who joined with `PLAY`.
///
/// Records are never removed; a departed player is only marked inactive so
/// that its letter stays retired for the rest of the game.
#[derive(Clone, Debug)]
pub struct Player {
    client: ClientId,
    name: String,
    letter: PlayerLetter,
    position: CellCoord,
    purse: u32,
    active: bool,
    view: VisibleGrid,
}

impl Player {
    pub(crate) fn new(
        client: ClientId,
        name: String,
        letter: PlayerLetter,
        position: CellCoord,
        view: VisibleGrid,
    ) -> Self {
        Self {
            client,
            name,
            letter,
            position,
            purse: 0,
            active: true,
            view,
        }
    }

    /// Client the player's messages are delivered to.
    #[must_use]
    pub const fn client(&self) -> ClientId {
        self.client
    }

    /// Name the player joined with, after sanitising.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Letter other players see.
    #[must_use]
    pub const fn letter(&self) -> PlayerLetter {
        self.letter
    }

    /// Cell the player occupies.
    #[must_use]
    pub const fn position(&self) -> CellCoord {
        self.position
    }

    /// Gold collected so far.
    #[must_use]
    pub const fn purse(&self) -> u32 {
        self.purse
    }

    /// Reports whether the player is still in the game.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// The player's private view of the map.
    #[must_use]
    pub const fn view(&self) -> &VisibleGrid {
        &self.view
    }

    pub(crate) fn set_position(&mut self, position: CellCoord) {
        self.position = position;
    }

    pub(crate) fn add_gold(&mut self, gold: u32) {
        self.purse += gold;
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
    }

    pub(crate) fn view_mut(&mut self) -> &mut VisibleGrid {
        &mut self.view
    }

    pub(crate) fn summary(&self) -> SummaryLine {
        SummaryLine {
            letter: self.letter,
            purse: self.purse,
            name: self.name.clone(),
        }
    }
}

/// Trims a requested name, caps its length and masks unprintable characters.
///
/// Returns `None` when nothing but whitespace was supplied.
pub(crate) fn sanitize_name(raw: &str, max_length: usize) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        trimmed
            .chars()
            .take(max_length)
            .map(|c| {
                if c.is_ascii_graphic() || c == ' ' || c == '\t' {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
    )
}
