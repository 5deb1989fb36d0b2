//! Error types for rankwire-store
//!
//! Only write failures surface as [`Error`]. A file that cannot be trusted on
//! read is described by [`Corruption`], which readers log and then treat as
//! "no data".

use thiserror::Error;

/// Store error type
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Core error
    #[error("core error: {0}")]
    Core(#[from] rankwire_core::Error),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a persisted file was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Corruption {
    #[error("file could not be read: {0}")]
    Unreadable(String),

    #[error("file could not be decrypted")]
    Decrypt,

    #[error("line without a key: {0:?}")]
    MalformedLine(String),

    #[error("unknown key {0:?}")]
    UnknownKey(String),

    #[error("duplicate key {0:?}")]
    DuplicateKey(&'static str),

    #[error("missing key {0:?}")]
    MissingKey(&'static str),

    #[error("unparseable {0} field")]
    BadField(&'static str),

    #[error("unsupported version {0:?}")]
    Version(String),

    #[error("season {found} does not match expected season {expected}")]
    SeasonMismatch { expected: u32, found: u32 },

    #[error("expected {expected} player entries, found {found}")]
    CountMismatch { expected: usize, found: usize },

    #[error("checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch { stored: u32, computed: u32 },
}

fn _assert_error_send_sync<T: Send + Sync>() {}
fn _error_is_send_sync() {
    _assert_error_send_sync::<Error>();
    _assert_error_send_sync::<Corruption>();
}
