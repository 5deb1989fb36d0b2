//! Rankwire Store - Persistence for rating data
//!
//! This crate provides the two files a client keeps per season:
//!
//! - **RecordStore**: the local player's own rating, with an optional
//!   pending mid-match delta
//! - **LedgerStore**: every other player's rating observed so far, merged
//!   last-writer-wins
//!
//! Both files are line-oriented text carrying a checksum over their canonical
//! content, optionally obfuscated by [`cipher`]. A file that fails any check is
//! logged and read as absent; reading never returns an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use rankwire_core::{PlayerTag, RatingConfig};
//! use rankwire_store::{LedgerStore, RecordStore, StorageLayout};
//!
//! let config = RatingConfig::load("rating.ron")?;
//! let layout = StorageLayout::from_config("saves", &config);
//! let records = RecordStore::from_config(&layout, &config);
//! let me = records.load_or_default(&PlayerTag::new("ranger")?, rankwire_core::time::now());
//!
//! let ledger = LedgerStore::from_config(&layout, &config);
//! ledger.merge(vec![me])?;
//! ```

pub mod cipher;
mod error;
mod format;
mod layout;
mod ledger;
mod rating_file;

pub use error::{Corruption, Error, Result};
pub use format::FILE_VERSION;
pub use layout::StorageLayout;
pub use ledger::{Ledger, LedgerStore, MergeOutcome, MergeSummary};
pub use rating_file::RecordStore;
