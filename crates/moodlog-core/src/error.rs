//! Error types for moodlog-core

use thiserror::Error;

/// Result type alias using moodlog-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in moodlog-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote store unreachable (connection refused, DNS, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Remote store answered with a non-success status
    #[error("Remote store returned HTTP {status}: {message}")]
    Protocol { status: u16, message: String },

    /// Malformed or schema-violating payload
    #[error("Decode error: {0}")]
    Decode(String),

    /// Local store transaction or query failure
    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// A record without identity reached an operation that needs one
    #[error("Note has no identity")]
    MissingIdentity,

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// A note with this identity is already stored
    #[error("Note already exists: {0}")]
    AlreadyExists(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A spawned remote task did not run to completion
    #[error("Remote task failed: {0}")]
    Task(String),
}

impl Error {
    /// Whether the error came from talking to the remote store.
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Protocol { .. } | Self::Decode(_)
        )
    }
}
