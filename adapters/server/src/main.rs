#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! UDP server that hosts a single game of Nuggets.

mod protocol;
mod session;

use std::{
    fs,
    net::{Ipv4Addr, UdpSocket},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use nuggets_core::GameConfig;
use nuggets_game::Game;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use session::Session;

const MAX_DATAGRAM: usize = 65_507;

/// Hosts one game of Nuggets over UDP.
#[derive(Parser, Debug)]
#[command(name = "nuggets-server", author, version, about, long_about = None)]
struct Args {
    /// Map file to play on.
    map: PathBuf,
    /// Seed for a reproducible game (default: random).
    seed: Option<u64>,
    /// TOML file overriding the default game settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// UDP port to listen on; 0 picks a free port.
    #[arg(long)]
    port: Option<u16>,
}

/// Settings read from the optional configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    port: Option<u16>,
    game: GameConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let file = match &args.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };
    let mut config = file.game;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let map = fs::read_to_string(&args.map)
        .with_context(|| format!("failed to read map at {}", args.map.display()))?;
    let game = Game::new(&map, config)
        .with_context(|| format!("failed to start a game on {}", args.map.display()))?;

    let port = args.port.or(file.port).unwrap_or(0);
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))
        .with_context(|| format!("failed to bind UDP port {port}"))?;
    let local = socket
        .local_addr()
        .context("failed to query the bound address")?;
    println!("serverPort={}", local.port());
    info!(port = local.port(), map = %args.map.display(), "server ready");

    serve(&socket, Session::new(game))
}

fn load_config(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config toml at {}", path.display()))
}

fn serve(socket: &UdpSocket, mut session: Session) -> Result<()> {
    let mut buffer = vec![0_u8; MAX_DATAGRAM];
    loop {
        let (length, from) = socket
            .recv_from(&mut buffer)
            .context("failed to receive datagram")?;
        let datagram = String::from_utf8_lossy(&buffer[..length]);
        let handled = session.handle(from, &datagram);
        for (to, text) in &handled.replies {
            if let Err(error) = socket.send_to(text.as_bytes(), to) {
                warn!(%to, %error, "failed to deliver message");
            }
        }
        if handled.finished {
            info!("game over, shutting down");
            return Ok(());
        }
    }
}
