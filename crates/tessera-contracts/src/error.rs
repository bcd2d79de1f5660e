//! Error types for the TESSERA audit chain.
//!
//! All fallible operations return `TesseraResult<T>`. Integrity corruption is
//! deliberately absent from this enum: a tampered entry is a finding reported
//! in an `IntegrityReport`, not a failure of the operation that found it.

use thiserror::Error;

/// The unified error type for the TESSERA crates.
#[derive(Debug, Error)]
pub enum TesseraError {
    /// The chain, tree, or report store could not be read or written.
    ///
    /// This is fatal. A mutation that cannot be persisted is rolled back and
    /// never reported as successful.
    #[error("storage error: {reason}")]
    Storage { reason: String },

    /// A value could not be canonically serialized, or stored JSON could not
    /// be decoded.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A Merkle proof was requested for a position past the end of the chain.
    #[error("index {index} is out of range for a chain of {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    /// A migration could not start or complete.
    #[error("migration failed: {reason}")]
    MigrationFailed { reason: String },
}

/// Convenience alias used throughout the TESSERA crates.
pub type TesseraResult<T> = Result<T, TesseraError>;

impl TesseraError {
    /// Wrap an I/O error with a short description of what was being attempted.
    pub fn storage(context: impl std::fmt::Display, err: std::io::Error) -> Self {
        Self::Storage {
            reason: format!("{}: {}", context, err),
        }
    }
}

impl From<serde_json::Error> for TesseraError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
