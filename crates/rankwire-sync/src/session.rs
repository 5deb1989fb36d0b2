//! Per-exchange bookkeeping of received chunks
//!
//! A [`SyncSession`] lives only while one exchange is collecting. It tracks,
//! for each expected remote sender, which chunks have arrived and how many
//! that sender declared, and marks the sender complete once it holds the full
//! set. Every check happens here, so a bad message from one sender can never
//! disturb another sender's progress.
//!
//! Channel keys are overwrite-only, so a key that held garbage may later hold
//! a valid envelope. The session remembers the last text seen under each key
//! and re-examines a key whenever its text changes.

use crate::protocol::{self, SyncMessage};
use indexmap::{IndexMap, IndexSet};
use rankwire_core::{PlayerRatingRecord, SlotId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Chunks received so far from one sender
#[derive(Debug, Clone, Default)]
pub struct SenderProgress {
    /// Payloads keyed by chunk index
    pub chunks: BTreeMap<usize, String>,
    /// Chunk count declared by the first accepted message
    pub declared_total: Option<usize>,
}

impl SenderProgress {
    /// Whether every declared chunk has arrived
    pub fn is_complete(&self) -> bool {
        self.declared_total == Some(self.chunks.len())
    }
}

/// Why a message was not stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Text under the key is not a valid envelope
    Malformed,
    /// Envelope names a different sender than the key it was found under
    SenderMismatch { expected: SlotId, found: SlotId },
    /// Envelope names a different chunk index than the key it was found under
    IndexMismatch { expected: usize, found: usize },
    /// Sender is not a remote participant of this exchange
    UnexpectedSender(SlotId),
    /// Chunk count disagrees with the sender's earlier messages
    TotalMismatch { declared: usize, found: usize },
    /// Sender declared more chunks than will ever be probed
    TooManyChunks { total: usize, limit: usize },
    /// A different payload was already stored for this chunk
    ConflictingPayload { index: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Malformed => write!(f, "malformed envelope"),
            Rejection::SenderMismatch { expected, found } => {
                write!(f, "sender {} published under slot {}", found, expected)
            }
            Rejection::IndexMismatch { expected, found } => {
                write!(f, "chunk {} published under index {}", found, expected)
            }
            Rejection::UnexpectedSender(slot) => write!(f, "unexpected sender {}", slot),
            Rejection::TotalMismatch { declared, found } => {
                write!(f, "chunk count {} contradicts declared {}", found, declared)
            }
            Rejection::TooManyChunks { total, limit } => {
                write!(f, "chunk count {} exceeds probe limit {}", total, limit)
            }
            Rejection::ConflictingPayload { index } => {
                write!(f, "conflicting payload for chunk {}", index)
            }
        }
    }
}

/// Result of offering one message to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// New chunk stored; sender still incomplete
    Stored,
    /// Same chunk seen before; nothing changed
    Duplicate,
    /// New chunk stored and the sender is now complete
    Completed,
    /// Message dropped
    Rejected(Rejection),
}

/// In-memory state of one exchange
#[derive(Debug, Clone)]
pub struct SyncSession {
    expected: IndexSet<SlotId>,
    probe_limit: usize,
    senders: IndexMap<SlotId, SenderProgress>,
    complete: IndexSet<SlotId>,
    /// Last text fetched under each probed key
    last_seen: HashMap<(SlotId, usize), String>,
    /// Distinct texts dropped, per key
    rejected: HashSet<(SlotId, usize, String)>,
}

impl SyncSession {
    /// Create a session expecting chunks from `remote` senders
    ///
    /// At most `probe_limit` chunk indices are probed per sender.
    pub fn new(remote: impl IntoIterator<Item = SlotId>, probe_limit: usize) -> Self {
        Self {
            expected: remote.into_iter().collect(),
            probe_limit: probe_limit.max(1),
            senders: IndexMap::new(),
            complete: IndexSet::new(),
            last_seen: HashMap::new(),
            rejected: HashSet::new(),
        }
    }

    /// Remote senders this session collects from
    pub fn expected(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.expected.iter().copied()
    }

    /// Chunk indices still worth probing for `sender`
    ///
    /// Once a sender's total is known only indices below it are probed.
    pub fn indices_to_probe(&self, sender: SlotId) -> Vec<usize> {
        if self.complete.contains(&sender) {
            return Vec::new();
        }
        let progress = self.senders.get(&sender);
        let bound = progress
            .and_then(|p| p.declared_total)
            .unwrap_or(self.probe_limit)
            .min(self.probe_limit);
        (0..bound)
            .filter(|i| !progress.is_some_and(|p| p.chunks.contains_key(i)))
            .collect()
    }

    /// Offer the raw text fetched under the key for (`slot`, `index`)
    ///
    /// Text identical to the last one seen under that key is not examined
    /// again and reports `Duplicate`. Each distinct rejected text counts once.
    pub fn offer(&mut self, slot: SlotId, index: usize, text: &str) -> AcceptOutcome {
        let key = (slot, index);
        if self.last_seen.get(&key).is_some_and(|seen| seen == text) {
            return AcceptOutcome::Duplicate;
        }
        self.last_seen.insert(key, text.to_string());

        let outcome = match protocol::parse(text) {
            Some(msg) => self.accept(slot, index, msg),
            None => AcceptOutcome::Rejected(Rejection::Malformed),
        };
        if let AcceptOutcome::Rejected(_) = outcome {
            self.rejected.insert((slot, index, text.to_string()));
        }
        outcome
    }

    /// Offer a parsed message found under the key for (`slot`, `index`)
    pub fn accept(&mut self, slot: SlotId, index: usize, msg: SyncMessage) -> AcceptOutcome {
        if let Err(rejection) = self.check(slot, index, &msg) {
            return AcceptOutcome::Rejected(rejection);
        }

        let progress = self.senders.entry(msg.sender).or_default();
        if let Some(existing) = progress.chunks.get(&msg.chunk_index) {
            if *existing == msg.payload {
                return AcceptOutcome::Duplicate;
            }
            return AcceptOutcome::Rejected(Rejection::ConflictingPayload {
                index: msg.chunk_index,
            });
        }

        progress.declared_total.get_or_insert(msg.total_chunks);
        progress.chunks.insert(msg.chunk_index, msg.payload);
        if progress.is_complete() {
            self.complete.insert(msg.sender);
            AcceptOutcome::Completed
        } else {
            AcceptOutcome::Stored
        }
    }

    fn check(&self, slot: SlotId, index: usize, msg: &SyncMessage) -> Result<(), Rejection> {
        if msg.sender != slot {
            return Err(Rejection::SenderMismatch {
                expected: slot,
                found: msg.sender,
            });
        }
        if msg.chunk_index != index {
            return Err(Rejection::IndexMismatch {
                expected: index,
                found: msg.chunk_index,
            });
        }
        if !self.expected.contains(&msg.sender) {
            return Err(Rejection::UnexpectedSender(msg.sender));
        }
        if msg.total_chunks > self.probe_limit {
            return Err(Rejection::TooManyChunks {
                total: msg.total_chunks,
                limit: self.probe_limit,
            });
        }
        let declared = self
            .senders
            .get(&msg.sender)
            .and_then(|p| p.declared_total);
        match declared {
            Some(declared) if declared != msg.total_chunks => Err(Rejection::TotalMismatch {
                declared,
                found: msg.total_chunks,
            }),
            _ => Ok(()),
        }
    }

    /// Number of distinct channel texts dropped by [`offer`](Self::offer)
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// Progress of one sender, if anything was accepted from it
    pub fn progress(&self, sender: SlotId) -> Option<&SenderProgress> {
        self.senders.get(&sender)
    }

    /// Senders holding a full chunk set, in completion order
    pub fn complete_senders(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.complete.iter().copied()
    }

    /// Expected senders that are not complete yet
    pub fn pending_senders(&self) -> Vec<SlotId> {
        self.expected
            .iter()
            .filter(|s| !self.complete.contains(*s))
            .copied()
            .collect()
    }

    /// Whether every expected sender is complete
    pub fn all_complete(&self) -> bool {
        self.expected.iter().all(|s| self.complete.contains(s))
    }

    /// Decode every complete sender's record
    ///
    /// A sender whose full chunk set fails to decode yields `None`.
    pub fn reassemble(&self) -> Vec<(SlotId, Option<PlayerRatingRecord>)> {
        self.complete
            .iter()
            .filter_map(|slot| {
                let progress = self.senders.get(slot)?;
                let total = progress.declared_total?;
                Some((*slot, protocol::reassemble(&progress.chunks, total)))
            })
            .collect()
    }
}
