//! Rankwire Core - Rating records shared by every rankwire crate
//!
//! This crate provides the leaf types of the rating exchange:
//! - Player identity (`PlayerTag`) and match slots (`SlotId`)
//! - Rating records with their tentative pending deltas
//! - Numeric canonicalisation and the rolling checksum built on it
//! - RON configuration (`RatingConfig`)
//!
//! Persistence lives in `rankwire-store`; the peer exchange in `rankwire-sync`.

pub mod checksum;
mod config;
mod error;
mod identity;
mod record;
pub mod time;

pub use config::RatingConfig;
pub use error::{Error, Result};
pub use identity::{PlayerTag, SlotId, MAX_SLOTS};
pub use record::{
    canonical_number, coerce_int, coerce_number, parse_canonical_number, parse_strict_int,
    PendingGameRecord, PlayerRatingRecord, RatingSnapshot, DEFAULT_RATING,
};
pub use time::{Millis, Timestamp};
