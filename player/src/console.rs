//! Line-oriented console commands read from stdin.

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use tv_common::{PlaybackError, Speed};
use tv_engine::Command;

pub const HELP: &str = "commands: play | pause | toggle | speed <x> | video <name> | tracker <mode> | \
filter class <name> | filter id <n> | filter clear | labels id|class on|off | status | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Player(Command),
    /// Replace the class part of the filter, keeping the id part.
    FilterClass(String),
    /// Replace the id part of the filter, keeping the class part.
    FilterId(u32),
    FilterClear,
    Labels { part: LabelPart, on: bool },
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPart {
    Id,
    Class,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConsoleError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

pub fn parse(line: &str) -> Result<Option<ConsoleInput>, ConsoleError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, rest)) = words.split_first() else {
        return Ok(None);
    };

    let input = match (head.to_lowercase().as_str(), rest) {
        ("play", []) => ConsoleInput::Player(Command::Play),
        ("pause", []) => ConsoleInput::Player(Command::Pause),
        ("toggle", []) => ConsoleInput::Player(Command::Toggle),
        ("speed", [value]) => ConsoleInput::Player(Command::SetSpeed(value.parse::<Speed>()?)),
        ("speed", _) => return Err(ConsoleError::Usage("speed <x>, e.g. speed 2 or speed 0.5")),
        // Video names may contain spaces.
        ("video", [_, ..]) => ConsoleInput::Player(Command::SelectVideo(rest.join(" "))),
        ("video", []) => return Err(ConsoleError::Usage("video <name>")),
        ("tracker", [mode]) => ConsoleInput::Player(Command::SelectTracker(mode.to_string())),
        ("tracker", _) => return Err(ConsoleError::Usage("tracker <mode>")),
        ("filter", ["clear"]) => ConsoleInput::FilterClear,
        ("filter", ["class", name]) => ConsoleInput::FilterClass(name.to_string()),
        ("filter", ["id", id]) => match id.parse() {
            Ok(id) => ConsoleInput::FilterId(id),
            Err(_) => return Err(ConsoleError::Usage("filter id <n>")),
        },
        ("filter", _) => return Err(ConsoleError::Usage("filter class <name> | filter id <n> | filter clear")),
        ("labels", [part, state]) => {
            let part = match *part {
                "id" => LabelPart::Id,
                "class" => LabelPart::Class,
                _ => return Err(ConsoleError::Usage("labels id|class on|off")),
            };
            let on = match *state {
                "on" => true,
                "off" => false,
                _ => return Err(ConsoleError::Usage("labels id|class on|off")),
            };
            ConsoleInput::Labels { part, on }
        }
        ("labels", _) => return Err(ConsoleError::Usage("labels id|class on|off")),
        ("status", []) => ConsoleInput::Status,
        ("help" | "?", _) => ConsoleInput::Help,
        ("quit" | "exit", []) => ConsoleInput::Quit,
        _ => return Err(ConsoleError::Unknown(line.trim().to_string())),
    };

    Ok(Some(input))
}

/// Forward parsed stdin lines until EOF or until the receiver is gone.
pub async fn read_stdin(tx: mpsc::Sender<ConsoleInput>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("Console: stdin closed");
                return;
            }
            Err(e) => {
                warn!("Console: read error: {}", e);
                return;
            }
        };

        match parse(&line) {
            Ok(Some(input)) => {
                if tx.send(input).await.is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => eprintln!("{}", e),
        }
    }
}
