//! Text codec for the datagram protocol spoken by Nuggets clients.

use std::fmt::Write as _;

use nuggets_core::{Action, Message, Step};
use thiserror::Error;

const PLAY: &str = "PLAY";
const SPECTATE: &str = "SPECTATE";
const KEY: &str = "KEY";

/// Reasons an inbound datagram cannot be turned into an action.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub(crate) enum ProtocolError {
    /// The datagram did not start with a known command.
    #[error("usage: PLAY <name>, SPECTATE or KEY <k>")]
    UnknownCommand(String),
    /// A `KEY` command did not carry exactly one character.
    #[error("usage: KEY <k>")]
    MalformedKey(String),
    /// The keystroke is not bound to any action.
    #[error("unknown keystroke")]
    UnknownKey(char),
}

/// Parses one inbound datagram.
pub(crate) fn parse(datagram: &str) -> Result<Action, ProtocolError> {
    let text = datagram.trim_end_matches(['\r', '\n']);
    let (command, rest) = text.split_once(' ').unwrap_or((text, ""));
    match command {
        PLAY => Ok(Action::Join {
            name: rest.to_owned(),
        }),
        SPECTATE if rest.trim().is_empty() => Ok(Action::Spectate),
        KEY => parse_key(rest),
        _ => Err(ProtocolError::UnknownCommand(text.to_owned())),
    }
}

fn parse_key(rest: &str) -> Result<Action, ProtocolError> {
    let mut chars = rest.trim().chars();
    let (Some(key), None) = (chars.next(), chars.next()) else {
        return Err(ProtocolError::MalformedKey(rest.to_owned()));
    };
    if key == 'Q' {
        return Ok(Action::Leave);
    }
    let step = step_for(key.to_ascii_lowercase()).ok_or(ProtocolError::UnknownKey(key))?;
    if key.is_ascii_uppercase() {
        Ok(Action::Slide { step })
    } else {
        Ok(Action::Move { step })
    }
}

fn step_for(key: char) -> Option<Step> {
    let step = match key {
        'h' => Step::LEFT,
        'l' => Step::RIGHT,
        'k' => Step::UP,
        'j' => Step::DOWN,
        'y' => Step::UP_LEFT,
        'u' => Step::UP_RIGHT,
        'b' => Step::DOWN_LEFT,
        'n' => Step::DOWN_RIGHT,
        _ => return None,
    };
    Some(step)
}

/// Renders an outbound message as datagram text.
#[must_use]
pub(crate) fn encode(message: &Message) -> String {
    match message {
        Message::JoinAccepted { letter } => format!("OK {}", letter.symbol()),
        Message::GridDimensions { rows, columns } => format!("GRID {rows} {columns}"),
        Message::GoldStatus {
            collected,
            purse,
            remaining,
        } => format!("GOLD {collected} {purse} {remaining}"),
        Message::Display { text } => format!("DISPLAY\n{text}"),
        Message::GameOver { summary } => {
            let mut text = String::from("QUIT GAME OVER:\n");
            for line in summary {
                let _ = writeln!(text, "{} {:>10} {}", line.letter.symbol(), line.purse, line.name);
            }
            text
        }
        Message::Error { reason } => format!("ERROR {reason}"),
        Message::JoinRejected { reason } | Message::Quit { reason } => format!("QUIT {reason}"),
    }
}
