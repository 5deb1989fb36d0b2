//! Error types for rankwire-sync
//!
//! The exchange itself never fails outward; these cover setting it up and the
//! failures the coordinator logs and absorbs.

use thiserror::Error;

/// Sync error type
#[derive(Debug, Error)]
pub enum Error {
    /// Channel namespace is unusable as a key prefix
    #[error("Invalid channel namespace: {0:?}")]
    InvalidNamespace(String),

    /// The shared channel refused a publish or fetch
    #[error("Channel error: {0}")]
    Channel(String),

    /// Persisting the ledger failed
    #[error("Store error: {0}")]
    Store(#[from] rankwire_store::Error),

    /// Invalid configuration or identity
    #[error("Core error: {0}")]
    Core(#[from] rankwire_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap any channel-specific error
    pub fn channel(err: impl std::fmt::Display) -> Self {
        Error::Channel(err.to_string())
    }
}

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, Error>;
