#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game coordinator for Nuggets.
//!
//! A [`Game`] owns the map grid, the roster of players and the single
//! spectator slot. Every inbound [`Action`] goes through [`apply`], which
//! resolves it completely (grid mutation, view recomputation, outbound
//! messages, end-of-game detection) before returning. The protocol adapter
//! owns the `Game` and drops it once [`ActionOutcome::GameOver`] is reported.

mod roster;

use nuggets_core::{
    Action, CellCoord, ClientId, GameConfig, Message, Outbound, PlayerLetter, Step,
};
use nuggets_system_visibility::VisibleGrid;
use nuggets_world::{MapGrid, MapLoadError, MoveResult, PopulateError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{info, warn};

pub use roster::Player;
use roster::sanitize_name;

const EMPTY_NAME: &str = "Sorry - you must provide player's name.";
const GAME_FULL: &str = "Game is full: no more players can join.";
const NO_SPAWN: &str = "No room left on the map for another player.";
const ALREADY_PLAYING: &str = "You are already playing.";
const PLAYERS_CANNOT_SPECTATE: &str = "Players cannot become the spectator.";
const THANKS_FOR_PLAYING: &str = "Thanks for playing!";
const THANKS_FOR_WATCHING: &str = "Thanks for watching!";
const SPECTATOR_REPLACED: &str = "You have been replaced by a new spectator.";

/// Failures that prevent a game from starting.
#[derive(Debug, Error)]
pub enum GameInitError {
    /// The map source could not be parsed.
    #[error("invalid map: {0}")]
    Map(#[from] MapLoadError),
    /// Gold could not be placed with the configured parameters.
    #[error("cannot place gold: {0}")]
    Gold(#[from] PopulateError),
}

/// Why an action was refused without changing any state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The step ran into rock, a boundary or the map edge.
    Blocked,
    /// The join request carried no usable name.
    EmptyName,
    /// Every player letter is already taken.
    GameFull,
    /// No open room cell was left to spawn on.
    NoSpawnPosition,
    /// The client already plays in this game.
    AlreadyPlaying,
    /// A current player asked to spectate.
    PlayerCannotSpectate,
}

/// Summary of how an action was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action changed the game.
    Applied,
    /// The action came from an unknown or departed client, or arrived after
    /// the game ended; nothing changed.
    Ignored,
    /// The action was refused; nothing changed.
    Rejected(Rejection),
    /// The action collected the last gold and ended the game.
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Running,
    Over,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StepOutcome {
    Blocked,
    Swapped,
    Moved { gold: u32 },
}

/// Authoritative state of one game session.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    grid: MapGrid,
    players: Vec<Player>,
    spectator: Option<ClientId>,
    gold_remaining: u32,
    rng: ChaCha8Rng,
    phase: Phase,
}

impl Game {
    /// Loads `map_text` and scatters the configured gold over it.
    pub fn new(map_text: &str, config: GameConfig) -> Result<Self, GameInitError> {
        let mut grid = MapGrid::load(map_text)?;
        let mut rng = rng_for(&config);
        grid.nuggets_populate(config.min_piles, config.max_piles, config.gold_total, &mut rng)?;
        info!(
            rows = grid.rows(),
            columns = grid.columns(),
            piles = grid.pile_count(),
            gold = grid.total_gold(),
            "game initialised"
        );
        Ok(Self::assemble(grid, config, rng))
    }

    /// Starts a game on a grid whose gold has already been placed.
    ///
    /// The remaining-gold counter starts at whatever gold lies on the grid.
    #[must_use]
    pub fn with_grid(grid: MapGrid, config: GameConfig) -> Self {
        let rng = rng_for(&config);
        Self::assemble(grid, config, rng)
    }

    fn assemble(grid: MapGrid, config: GameConfig, rng: ChaCha8Rng) -> Self {
        let capacity = config.player_capacity();
        Self {
            gold_remaining: grid.total_gold(),
            players: Vec::with_capacity(capacity),
            spectator: None,
            phase: Phase::Running,
            config,
            grid,
            rng,
        }
    }

    /// The master grid.
    #[must_use]
    pub const fn grid(&self) -> &MapGrid {
        &self.grid
    }

    /// Every player that ever joined, in join order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// The player holding `letter`, active or not.
    #[must_use]
    pub fn player(&self, letter: PlayerLetter) -> Option<&Player> {
        self.players.get(letter.index())
    }

    /// The active player connected as `client`.
    #[must_use]
    pub fn player_for(&self, client: ClientId) -> Option<&Player> {
        self.active_index(client).map(|index| &self.players[index])
    }

    /// The current spectator, if any.
    #[must_use]
    pub const fn spectator(&self) -> Option<ClientId> {
        self.spectator
    }

    /// Gold not yet collected.
    #[must_use]
    pub const fn gold_remaining(&self) -> u32 {
        self.gold_remaining
    }

    /// Reports whether the last gold has been collected.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == Phase::Over
    }

    fn active_index(&self, client: ClientId) -> Option<usize> {
        self.players
            .iter()
            .position(|player| player.is_active() && player.client() == client)
    }

    fn join(&mut self, client: ClientId, name: &str, out: &mut Vec<Outbound>) -> ActionOutcome {
        if self.active_index(client).is_some() {
            return self.reject(client, Rejection::AlreadyPlaying, out);
        }
        let Some(name) = sanitize_name(name, self.config.max_name_length) else {
            return self.reject(client, Rejection::EmptyName, out);
        };
        let Some(letter) = PlayerLetter::from_index(self.players.len())
            .filter(|_| self.players.len() < self.config.player_capacity())
        else {
            return self.reject(client, Rejection::GameFull, out);
        };
        let Some(position) = self.grid.find_random_spawn_position(&mut self.rng) else {
            return self.reject(client, Rejection::NoSpawnPosition, out);
        };
        if !self.grid.add_player(position, letter) {
            return self.reject(client, Rejection::NoSpawnPosition, out);
        }

        if self.spectator == Some(client) {
            self.spectator = None;
        }
        info!(client = client.get(), letter = %letter.symbol(), %name, "player joined");
        let view = VisibleGrid::unseen(self.grid.columns(), self.grid.rows());
        self.players
            .push(Player::new(client, name, letter, position, view));

        out.push(Outbound::new(client, Message::JoinAccepted { letter }));
        out.push(Outbound::new(client, self.dimensions()));
        out.push(Outbound::new(
            client,
            Message::GoldStatus {
                collected: 0,
                purse: 0,
                remaining: self.gold_remaining,
            },
        ));
        self.refresh_views(out);
        ActionOutcome::Applied
    }

    fn leave(&mut self, client: ClientId, out: &mut Vec<Outbound>) -> ActionOutcome {
        if let Some(index) = self.active_index(client) {
            let player = &mut self.players[index];
            player.deactivate();
            let (letter, position) = (player.letter(), player.position());
            let _ = self.grid.remove_player(letter, position);
            info!(client = client.get(), letter = %letter.symbol(), "player left");
            out.push(quit(client, THANKS_FOR_PLAYING));
            self.refresh_views(out);
            return ActionOutcome::Applied;
        }
        if self.spectator == Some(client) {
            self.spectator = None;
            info!(client = client.get(), "spectator left");
            out.push(quit(client, THANKS_FOR_WATCHING));
            return ActionOutcome::Applied;
        }
        warn!(client = client.get(), "leave from unknown client");
        ActionOutcome::Ignored
    }

    fn spectate(&mut self, client: ClientId, out: &mut Vec<Outbound>) -> ActionOutcome {
        if self.active_index(client).is_some() {
            return self.reject(client, Rejection::PlayerCannotSpectate, out);
        }
        if let Some(previous) = self.spectator.replace(client) {
            if previous != client {
                info!(previous = previous.get(), client = client.get(), "spectator replaced");
                out.push(quit(previous, SPECTATOR_REPLACED));
            }
        } else {
            info!(client = client.get(), "spectator joined");
        }

        out.push(Outbound::new(client, self.dimensions()));
        out.push(Outbound::new(
            client,
            Message::GoldStatus {
                collected: 0,
                purse: 0,
                remaining: self.gold_remaining,
            },
        ));
        out.push(Outbound::new(
            client,
            Message::Display {
                text: self.grid.display(),
            },
        ));
        ActionOutcome::Applied
    }

    fn single_step(
        &mut self,
        client: ClientId,
        step: Step,
        out: &mut Vec<Outbound>,
    ) -> ActionOutcome {
        let Some(index) = self.active_index(client) else {
            warn!(client = client.get(), "move from client without an active player");
            return ActionOutcome::Ignored;
        };
        let gold = match self.step_player(index, step) {
            StepOutcome::Blocked => return ActionOutcome::Rejected(Rejection::Blocked),
            StepOutcome::Swapped => 0,
            StepOutcome::Moved { gold } => gold,
        };
        self.finish_turn(index, gold, out)
    }

    fn slide(&mut self, client: ClientId, step: Step, out: &mut Vec<Outbound>) -> ActionOutcome {
        let Some(index) = self.active_index(client) else {
            warn!(client = client.get(), "slide from client without an active player");
            return ActionOutcome::Ignored;
        };
        let mut gold = 0;
        let mut steps = 0usize;
        loop {
            match self.step_player(index, step) {
                StepOutcome::Blocked => break,
                StepOutcome::Swapped => {}
                StepOutcome::Moved { gold: collected } => gold += collected,
            }
            steps += 1;
        }
        if steps == 0 {
            return ActionOutcome::Rejected(Rejection::Blocked);
        }
        self.finish_turn(index, gold, out)
    }

    /// Moves one player a single cell, keeping both records in step with the
    /// grid when a swap is needed.
    fn step_player(&mut self, index: usize, step: Step) -> StepOutcome {
        let from = self.players[index].position();
        match self.grid.move_player(from, step) {
            MoveResult::Blocked => StepOutcome::Blocked,
            MoveResult::SwapNeeded { other, at } => {
                self.grid.swap_players(from, at);
                self.players[index].set_position(at);
                if let Some(displaced) = self.players.get_mut(other.index()) {
                    displaced.set_position(from);
                }
                StepOutcome::Swapped
            }
            MoveResult::Moved { to, gold } => {
                self.players[index].set_position(to);
                StepOutcome::Moved { gold }
            }
        }
    }

    fn finish_turn(
        &mut self,
        index: usize,
        gold: u32,
        out: &mut Vec<Outbound>,
    ) -> ActionOutcome {
        let collected = gold > 0;
        if collected {
            self.players[index].add_gold(gold);
            self.gold_remaining = self.gold_remaining.saturating_sub(gold);
            self.broadcast_gold(index, gold, out);
        }
        self.refresh_views(out);
        // Only a collection can empty the map; a gold-free grid never ends.
        if collected && self.gold_remaining == 0 {
            self.game_over(out);
            return ActionOutcome::GameOver;
        }
        ActionOutcome::Applied
    }

    fn broadcast_gold(&self, collector: usize, gold: u32, out: &mut Vec<Outbound>) {
        for (index, player) in self.players.iter().enumerate() {
            if !player.is_active() {
                continue;
            }
            let collected = if index == collector { gold } else { 0 };
            out.push(Outbound::new(
                player.client(),
                Message::GoldStatus {
                    collected,
                    purse: player.purse(),
                    remaining: self.gold_remaining,
                },
            ));
        }
        if let Some(spectator) = self.spectator {
            out.push(Outbound::new(
                spectator,
                Message::GoldStatus {
                    collected: 0,
                    purse: 0,
                    remaining: self.gold_remaining,
                },
            ));
        }
    }

    fn refresh_views(&mut self, out: &mut Vec<Outbound>) {
        let grid = &self.grid;
        for player in self.players.iter_mut().filter(|player| player.is_active()) {
            let position = player.position();
            let view = player.view_mut();
            view.refresh(grid, position);
            let text = view.render();
            out.push(Outbound::new(player.client(), Message::Display { text }));
        }
        if let Some(spectator) = self.spectator {
            out.push(Outbound::new(
                spectator,
                Message::Display {
                    text: grid.display(),
                },
            ));
        }
    }

    fn game_over(&mut self, out: &mut Vec<Outbound>) {
        let summary: Vec<_> = self.players.iter().map(Player::summary).collect();
        let recipients = self
            .players
            .iter()
            .filter(|player| player.is_active())
            .map(Player::client)
            .chain(self.spectator);
        for client in recipients {
            out.push(Outbound::new(
                client,
                Message::GameOver {
                    summary: summary.clone(),
                },
            ));
        }
        for player in &mut self.players {
            player.deactivate();
        }
        self.spectator = None;
        self.phase = Phase::Over;
        info!(players = summary.len(), "game over");
    }

    fn reject(
        &self,
        client: ClientId,
        rejection: Rejection,
        out: &mut Vec<Outbound>,
    ) -> ActionOutcome {
        warn!(client = client.get(), ?rejection, "action rejected");
        let message = match rejection {
            Rejection::EmptyName => Some(Message::JoinRejected {
                reason: EMPTY_NAME.to_owned(),
            }),
            Rejection::GameFull => Some(Message::JoinRejected {
                reason: GAME_FULL.to_owned(),
            }),
            Rejection::NoSpawnPosition => Some(Message::JoinRejected {
                reason: NO_SPAWN.to_owned(),
            }),
            Rejection::AlreadyPlaying => Some(Message::Error {
                reason: ALREADY_PLAYING.to_owned(),
            }),
            Rejection::PlayerCannotSpectate => Some(Message::Error {
                reason: PLAYERS_CANNOT_SPECTATE.to_owned(),
            }),
            Rejection::Blocked => None,
        };
        if let Some(message) = message {
            out.push(Outbound::new(client, message));
        }
        ActionOutcome::Rejected(rejection)
    }

    fn dimensions(&self) -> Message {
        Message::GridDimensions {
            rows: self.grid.rows(),
            columns: self.grid.columns(),
        }
    }
}

/// Resolves one action from `client`, appending every resulting message to `out`.
pub fn apply(
    game: &mut Game,
    client: ClientId,
    action: Action,
    out: &mut Vec<Outbound>,
) -> ActionOutcome {
    if game.is_over() {
        return ActionOutcome::Ignored;
    }
    match action {
        Action::Join { name } => game.join(client, &name, out),
        Action::Move { step } => game.single_step(client, step, out),
        Action::Slide { step } => game.slide(client, step, out),
        Action::Spectate => game.spectate(client, out),
        Action::Leave => game.leave(client, out),
    }
}

/// Cells currently occupied by active players, for invariant checks and debugging.
#[must_use]
pub fn occupied_cells(game: &Game) -> Vec<(PlayerLetter, CellCoord)> {
    game.players
        .iter()
        .filter(|player| player.is_active())
        .map(|player| (player.letter(), player.position()))
        .collect()
}

fn rng_for(config: &GameConfig) -> ChaCha8Rng {
    config
        .seed
        .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64)
}

fn quit(client: ClientId, reason: &str) -> Outbound {
    Outbound::new(
        client,
        Message::Quit {
            reason: reason.to_owned(),
        },
    )
}
