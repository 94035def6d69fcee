//! Error types for the fitpro_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fitpro_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or out-of-range argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Reference to an exercise or set that does not exist in the session
    #[error("Not found: {0}")]
    NotFound(String),

    /// Attempt to complete a set twice
    #[error("Set {set_index} of exercise {exercise_index} is already completed")]
    AlreadyCompleted {
        exercise_index: usize,
        set_index: usize,
    },

    /// Operation not allowed in the current session status
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Set edits were requested but the store was built without them
    #[error("Editing completed sets is disabled")]
    EditDisabled,

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for building an `InvalidInput` error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
