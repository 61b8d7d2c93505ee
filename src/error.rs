// Error type for the fallible edges of the bot: config files, debug logs,
// replay lookups and malformed wire snapshots. The search itself never fails.

use std::io;

#[derive(thiserror::Error, Debug)]
pub enum TronError {
    #[error("failed to read '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("failed to parse JSON on line {line}: {source}")]
    LogParse {
        line: usize,
        source: serde_json::Error,
    },
    #[error("invalid direction: {0}")]
    InvalidDirection(String),
    #[error("turn {0} not found in log")]
    TurnNotFound(u32),
    #[error("turn {turn}: expected one of {expected:?}, but got {actual}")]
    UnexpectedMove {
        turn: u32,
        expected: Vec<String>,
        actual: String,
    },
    #[error("malformed board: {0}")]
    MalformedBoard(String),
    #[error("player index {index} out of range for {players} players")]
    PlayerOutOfRange { index: usize, players: usize },
    #[error("request does not fit the running game: {0}")]
    GameMismatch(String),
}
