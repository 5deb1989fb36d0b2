//! Rankwire Sync - Match-start rating exchange between peers
//!
//! This crate lets every client of a match learn every other participant's
//! rating without a server:
//!
//! - **Protocol**: encode a record, split it into chunks, wrap each in an envelope
//! - **Channel**: the shared key-value store peers publish to and probe
//! - **Session**: per-sender chunk bookkeeping and completeness
//! - **Coordinator**: the broadcast / collect / merge state machine
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  envelopes   ┌──────────────────┐   envelopes  ┌─────────────┐
//! │   Peer A    │─────────────▶│ BroadcastChannel │◀─────────────│   Peer B    │
//! │ Coordinator │◀──── probe ──│ {ns}/{slot}/{i}  │── probe ────▶│ Coordinator │
//! └─────────────┘              └──────────────────┘              └─────────────┘
//!        │ deadline                                                      │
//!        ▼                                                               ▼
//!  RecordStore ─▶ LedgerStore (last writer wins)          RecordStore ─▶ LedgerStore
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rankwire_core::{RatingConfig, SlotId};
//! use rankwire_store::StorageLayout;
//! use rankwire_sync::{MemoryChannel, Participant, PeerSyncCoordinator};
//!
//! let config = RatingConfig::default();
//! let layout = StorageLayout::from_config("saves", &config);
//! let mut sync = PeerSyncCoordinator::from_layout(
//!     config, channel, &layout, SlotId::new(0)?, "match-4471",
//! )?;
//!
//! sync.start_sync(&participants, clock.now());
//! loop {
//!     if let Some(outcome) = sync.advance(clock.now()) {
//!         println!("{:?}", outcome);
//!         break;
//!     }
//! }
//! ```

mod channel;
mod coordinator;
mod error;
pub mod protocol;
mod session;

pub use channel::{channel_key, BroadcastChannel, DirectoryChannel, MemoryChannel};
pub use coordinator::{
    Participant, PeerSyncCoordinator, SkipReason, SyncOutcome, SyncReport, SyncState,
    MIN_PARTICIPANTS,
};
pub use error::{Error, Result};
pub use protocol::SyncMessage;
pub use session::{AcceptOutcome, Rejection, SenderProgress, SyncSession};
