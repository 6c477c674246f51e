// Runtime error type
// The drive primitives themselves are total; only transport and config loading can fail.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Wrap a zenoh error, which only promises `Display`
pub fn transport<E: std::fmt::Display>(e: E) -> RuntimeError {
    RuntimeError::Transport(e.to_string())
}
