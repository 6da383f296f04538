//! Error types for keyferry.

use thiserror::Error;

use crate::record::RecordError;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, FerryError>;

/// Errors surfaced by export, import, and store operations.
///
/// Everything here is fatal to the running pass: malformed records and
/// unknown enumerators are handled locally with a warning and never
/// reach this type, except for [`RecordError`]s whose
/// [`is_fatal`](RecordError::is_fatal) check says otherwise.
#[derive(Debug, Error)]
pub enum FerryError {
    /// A store command failed.
    #[error("store error: {0}")]
    Store(#[from] redis::RedisError),

    /// A key held a different kind of value than the operation expected.
    #[error("wrong kind for key '{key}': expected {expected}")]
    WrongKind {
        /// The offending key.
        key: String,
        /// The kind the operation required.
        expected: &'static str,
    },

    /// Local file I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest could not be read or parsed.
    #[error("manifest error: {0}")]
    Manifest(#[from] csv::Error),

    /// Connecting or authenticating to the store failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Configuration was missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// An interchange record could not be decoded.
    #[error("record error: {0}")]
    Record(#[from] RecordError),
}
