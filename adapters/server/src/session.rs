//! Binds peer addresses to game clients and routes datagrams through the game.

use std::{collections::HashMap, net::SocketAddr};

use nuggets_core::{Action, ClientId};
use nuggets_game::{apply, ActionOutcome, Game};
use tracing::{debug, warn};

use crate::protocol::{self, ProtocolError};

/// Datagrams produced while handling one inbound datagram.
#[derive(Debug, Default)]
pub(crate) struct Handled {
    /// Encoded messages and the peers they go to, in emission order.
    pub(crate) replies: Vec<(SocketAddr, String)>,
    /// Set once the game has ended and the server should stop.
    pub(crate) finished: bool,
}

#[derive(Debug, Default)]
struct Peers {
    ids: HashMap<SocketAddr, ClientId>,
    addresses: Vec<SocketAddr>,
}

impl Peers {
    fn lookup(&self, address: SocketAddr) -> Option<ClientId> {
        self.ids.get(&address).copied()
    }

    fn id_for(&mut self, address: SocketAddr) -> ClientId {
        if let Some(id) = self.ids.get(&address) {
            return *id;
        }
        let id = ClientId::new(self.addresses.len() as u64);
        self.addresses.push(address);
        let _ = self.ids.insert(address, id);
        id
    }

    fn address_of(&self, id: ClientId) -> Option<SocketAddr> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.addresses.get(index).copied())
    }
}

/// A running game together with the peers that have talked to it.
#[derive(Debug)]
pub(crate) struct Session {
    game: Game,
    peers: Peers,
}

impl Session {
    pub(crate) fn new(game: Game) -> Self {
        Self {
            game,
            peers: Peers::default(),
        }
    }

    /// Resolves one datagram from `from`.
    ///
    /// Only senders that join or spectate are given a client identity; other
    /// datagrams from unknown addresses are dropped.
    pub(crate) fn handle(&mut self, from: SocketAddr, datagram: &str) -> Handled {
        let action = match protocol::parse(datagram) {
            Ok(action) => action,
            Err(error) => return Self::refuse(from, &error),
        };
        debug!(%from, ?action, "datagram received");
        let client = match action {
            Action::Join { .. } | Action::Spectate => self.peers.id_for(from),
            _ => match self.peers.lookup(from) {
                Some(client) => client,
                None => {
                    warn!(%from, "datagram from an address that never joined");
                    return Handled::default();
                }
            },
        };

        let mut outbound = Vec::new();
        let outcome = apply(&mut self.game, client, action, &mut outbound);
        let replies = outbound
            .iter()
            .filter_map(|message| match self.peers.address_of(message.to) {
                Some(address) => Some((address, protocol::encode(&message.message))),
                None => {
                    warn!(client = message.to.get(), "no address for outbound message");
                    None
                }
            })
            .collect();
        Handled {
            replies,
            finished: outcome == ActionOutcome::GameOver,
        }
    }

    fn refuse(from: SocketAddr, error: &ProtocolError) -> Handled {
        warn!(%from, %error, "malformed datagram");
        Handled {
            replies: vec![(from, format!("ERROR {error}"))],
            finished: false,
        }
    }
}
