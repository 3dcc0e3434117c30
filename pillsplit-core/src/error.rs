//! Error types for pillsplit.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur in pillsplit operations.
#[derive(Error, Debug)]
pub enum PillError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The custody feed contradicts the periodic-schedule assumption.
    #[error("Custody data integrity error: {0}")]
    DataIntegrity(String),

    /// The custody calendar could not be read.
    #[error("Custody calendar unavailable: {0}")]
    UpstreamFetch(String),

    #[error("Invalid custody interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid date window: {start} is after {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Ledger error: {0}")]
    Ledger(#[from] rusqlite::Error),

    #[error("Ledger schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for pillsplit operations.
pub type PillResult<T> = Result<T, PillError>;
