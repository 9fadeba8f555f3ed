use std::path::PathBuf;

/// Core error type.
///
/// Adapter crates map their specific errors into this type. `Usage` and
/// `UnknownUser` are recoverable and rendered back to the chat; none of the
/// variants stop the dispatch loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid state file: {path}: {reason}")]
    InvalidState { path: PathBuf, reason: String },

    #[error("usage: {0}")]
    Usage(String),

    #[error("user @{username} has not been seen in this chat")]
    UnknownUser { username: String },

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
