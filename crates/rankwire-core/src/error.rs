//! Error types for rankwire-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Slot {0} is outside the valid range 0..{max}", max = crate::MAX_SLOTS)]
    InvalidSlot(u32),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
