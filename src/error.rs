//! Error types for the treeport library.

use thiserror::Error;

/// The primary error type for all fallible library operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The End of Central Directory record could not be located.
    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    /// A container parsed, but a required entry is missing from it.
    #[error("Container is missing required entry `{0}`")]
    MissingEntry(String),

    /// Neither a project container nor a legacy export with at least one record.
    #[error("Unrecognized input format")]
    UnrecognizedFormat,

    /// A JSON payload could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error originating from I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` type alias using the crate's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
