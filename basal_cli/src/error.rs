//! Error types for the podbasal binary.

use std::io;

/// Result type alias using our CliError type
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors surfaced by the command line front end
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Encoding or status calculation failed
    #[error(transparent)]
    Core(#[from] basal_core::Error),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unparseable time of day
    #[error("Invalid time of day '{0}', expected HH:MM or HH:MM:SS")]
    Time(String),
}
