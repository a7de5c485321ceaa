//! Error types for postlens.

use thiserror::Error;

/// Result type alias for postlens operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the data-access layer and the engine's ambient services.
#[derive(Error, Debug, Clone)]
pub enum Error {
    // Data access errors
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Analytics API request failed: {0}")]
    Api(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
