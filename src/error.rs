//! Ledger error types.

use thiserror::Error;

/// Errors surfaced to the user by intake, storage and configuration.
///
/// Aggregation never produces one of these: every projection is total over
/// a well-formed entry collection.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Raw input rejected before it reaches the parsing service.
    #[error("invalid input: {0}")]
    Input(String),

    /// The parsing service failed, returned nothing usable, or left out a
    /// required field. Nothing is committed.
    #[error("failed to parse entry: {0}")]
    ParseFailure(String),

    /// Persisted data could not be read back.
    #[error("stored ledger is unreadable: {0}")]
    StorageCorruption(String),

    /// The recording could not be captured or read.
    #[error("audio device access denied: {0}")]
    DeviceAccess(String),

    /// No entry carries the given id.
    #[error("entry not found: {0}")]
    NotFound(String),

    /// Underlying SQLite failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Figment extraction or merge error.
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        LedgerError::ParseFailure(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::ParseFailure(format!("malformed JSON: {err}"))
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
