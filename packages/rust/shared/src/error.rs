//! Error types for paperscout.
//!
//! Library crates use [`PaperScoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all paperscout operations.
#[derive(Debug, thiserror::Error)]
pub enum PaperScoutError {
    /// Configuration loading, validation, or missing credential.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to an external service.
    #[error("network error: {0}")]
    Network(String),

    /// Feed, HTML, or JSON parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Persistence collaborator error (Notion or local archive).
    #[error("storage error: {0}")]
    Storage(String),

    /// Translation service error or unusable translation result.
    #[error("translation error: {0}")]
    Translation(String),

    /// Messaging service error.
    #[error("notify error: {0}")]
    Notify(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PaperScoutError>;

impl PaperScoutError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
