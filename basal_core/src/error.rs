//! Error types for the basal_core library.

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for basal_core operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Slot or pulse table does not describe a 48-slot day
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Basal program segments do not tile the day
    #[error("Invalid basal program: {0}")]
    InvalidProgram(String),

    /// A decision point assumed to be exhaustive found no matching case
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),
}
