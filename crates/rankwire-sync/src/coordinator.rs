//! Timer-driven rating exchange for one match
//!
//! The coordinator never sleeps or spawns. The host calls
//! [`start_sync`](PeerSyncCoordinator::start_sync) once when a rated match
//! begins and then [`advance`](PeerSyncCoordinator::advance) with the current
//! logical time whenever it likes. Due timers fire in order:
//!
//! - `Publish(i)` - one per local chunk, paced `chunk_delay` apart
//! - `Poll` - probe the channel for remote chunks every `poll_interval`
//! - `Deadline` - one last poll, then complete
//!
//! Completion runs at most once; any timer still queued afterwards is dropped.

use crate::channel::{channel_key, BroadcastChannel};
use crate::protocol;
use crate::session::{AcceptOutcome, SyncSession};
use crate::{Error, Result};
use rankwire_core::time::to_millis;
use rankwire_core::{Millis, PlayerRatingRecord, RatingConfig, SlotId};
use rankwire_store::{LedgerStore, MergeSummary, RecordStore, StorageLayout};
use tracing::{debug, info, warn};

/// Minimum number of eligible participants for an exchange
pub const MIN_PARTICIPANTS: usize = 2;

/// Where the exchange currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// Local chunks are still being published
    Broadcasting,
    /// Everything local is out; only collecting remains
    Collecting,
    Completed,
}

/// One match participant as seen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    pub slot: SlotId,
    /// Whether this participant takes part in rated play
    pub eligible: bool,
}

impl Participant {
    pub fn eligible(slot: SlotId) -> Self {
        Self {
            slot,
            eligible: true,
        }
    }
}

/// Why `start_sync` did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Exchange switched off in config
    Disabled,
    /// Fewer than [`MIN_PARTICIPANTS`] eligible participants
    TooFewParticipants { eligible: usize },
    /// An exchange was already started on this coordinator
    AlreadyStarted,
}

/// Summary of a finished exchange
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// Local chunks published to the channel
    pub published_chunks: usize,
    /// Remote senders whose record was received and decoded
    pub complete_senders: Vec<SlotId>,
    /// Remote senders left out of the merge
    pub incomplete_senders: Vec<SlotId>,
    /// Distinct channel entries dropped as invalid
    pub rejected_messages: usize,
    /// Records handed to the ledger, the local one included
    pub merged_records: usize,
    /// Ledger merge result, or `None` if persisting failed
    pub merge: Option<MergeSummary>,
    /// Completed before the deadline because every sender was done
    pub finished_early: bool,
}

/// What a call into the coordinator produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Skipped(SkipReason),
    Completed(SyncReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Publish(usize),
    Poll,
    Deadline,
}

/// Runs one exchange: broadcast, collect, merge
pub struct PeerSyncCoordinator<C: BroadcastChannel> {
    config: RatingConfig,
    channel: C,
    records: RecordStore,
    ledger: LedgerStore,
    local_slot: SlotId,
    namespace: String,
    state: SyncState,
    session: Option<SyncSession>,
    local_record: Option<PlayerRatingRecord>,
    outbox: Vec<String>,
    published: usize,
    /// Pending timers, ordered by due time (stable for equal times)
    timers: Vec<(Millis, Timer)>,
    finished: bool,
}

impl<C: BroadcastChannel> PeerSyncCoordinator<C> {
    /// Create a coordinator for the peer in `local_slot`
    ///
    /// `namespace` must be identical on every peer of the match and distinct
    /// between matches.
    pub fn new(
        config: RatingConfig,
        channel: C,
        records: RecordStore,
        ledger: LedgerStore,
        local_slot: SlotId,
        namespace: impl Into<String>,
    ) -> Result<Self> {
        config.validate()?;
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(Error::InvalidNamespace(namespace));
        }
        Ok(Self {
            config,
            channel,
            records,
            ledger,
            local_slot,
            namespace,
            state: SyncState::Idle,
            session: None,
            local_record: None,
            outbox: Vec::new(),
            published: 0,
            timers: Vec::new(),
            finished: false,
        })
    }

    /// Create a coordinator using the season files under `layout`
    pub fn from_layout(
        config: RatingConfig,
        channel: C,
        layout: &StorageLayout,
        local_slot: SlotId,
        namespace: impl Into<String>,
    ) -> Result<Self> {
        let records = RecordStore::from_config(layout, &config);
        let ledger = LedgerStore::from_config(layout, &config);
        Self::new(config, channel, records, ledger, local_slot, namespace)
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn local_slot(&self) -> SlotId {
        self.local_slot
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// The live session, while collecting
    pub fn session(&self) -> Option<&SyncSession> {
        self.session.as_ref()
    }

    /// Due time of the next timer, if any is queued
    pub fn next_due(&self) -> Option<Millis> {
        self.timers.first().map(|(due, _)| *due)
    }

    /// Begin the exchange at logical time `now`
    ///
    /// Returns `Skipped` when preconditions fail, `Completed` in the unusual
    /// case that the deadline is already due, and `None` while running.
    pub fn start_sync(
        &mut self,
        participants: &[Participant],
        now: Millis,
    ) -> Option<SyncOutcome> {
        if let Some(reason) = self.precondition(participants) {
            info!(slot = %self.local_slot, ?reason, "rating sync skipped");
            return Some(SyncOutcome::Skipped(reason));
        }

        let remote: Vec<SlotId> = participants
            .iter()
            .filter(|p| p.eligible && p.slot != self.local_slot)
            .map(|p| p.slot)
            .collect();
        let remote_count = remote.len();
        self.session = Some(SyncSession::new(remote, self.config.probe_limit()));
        self.state = SyncState::Broadcasting;

        self.local_record = self.records.read();
        match &self.local_record {
            Some(record) => {
                let encoded = protocol::serialize(record);
                self.outbox =
                    protocol::envelopes(&encoded, self.local_slot, self.config.chunk_size());
            }
            None => info!(slot = %self.local_slot, "no local rating record; collecting only"),
        }

        let delay = to_millis(self.config.chunk_delay());
        for i in 0..self.outbox.len() {
            let offset = delay.saturating_mul(i as u64);
            self.schedule(now.saturating_add(offset), Timer::Publish(i));
        }
        self.schedule(
            now.saturating_add(to_millis(self.config.poll_interval())),
            Timer::Poll,
        );
        self.schedule(
            now.saturating_add(to_millis(self.config.sync_timeout())),
            Timer::Deadline,
        );
        info!(
            slot = %self.local_slot,
            namespace = %self.namespace,
            chunks = self.outbox.len(),
            remote = remote_count,
            "rating sync started"
        );
        if self.outbox.is_empty() {
            self.state = SyncState::Collecting;
        }

        self.advance(now)
    }

    fn precondition(&self, participants: &[Participant]) -> Option<SkipReason> {
        if self.state != SyncState::Idle {
            return Some(SkipReason::AlreadyStarted);
        }
        if !self.config.sync_enabled {
            return Some(SkipReason::Disabled);
        }
        let eligible = participants.iter().filter(|p| p.eligible).count();
        if eligible < MIN_PARTICIPANTS {
            return Some(SkipReason::TooFewParticipants { eligible });
        }
        None
    }

    fn schedule(&mut self, due: Millis, timer: Timer) {
        self.timers.push((due, timer));
        self.timers.sort_by_key(|(due, _)| *due);
    }

    /// Fire every timer due at or before `now`
    ///
    /// Returns the report the one time the exchange completes.
    pub fn advance(&mut self, now: Millis) -> Option<SyncOutcome> {
        while let Some(&(due, timer)) = self.timers.first() {
            if due > now || self.finished {
                break;
            }
            self.timers.remove(0);
            match timer {
                Timer::Publish(index) => self.publish(index, due),
                Timer::Poll => {
                    self.poll();
                    self.schedule(
                        due.saturating_add(to_millis(self.config.poll_interval())),
                        Timer::Poll,
                    );
                }
                Timer::Deadline => {
                    self.poll();
                    return self.finish(false);
                }
            }
            if self.ready_to_finish_early() {
                return self.finish(true);
            }
        }
        None
    }

    fn publish(&mut self, index: usize, due: Millis) {
        let Some(text) = self.outbox.get(index) else {
            return;
        };
        let key = channel_key(&self.namespace, self.local_slot, index);
        match self.channel.publish(&key, text) {
            Ok(()) => {
                debug!(%key, "published rating chunk");
                self.published += 1;
                if self.published == self.outbox.len() {
                    self.state = SyncState::Collecting;
                }
            }
            Err(e) => {
                warn!(%key, error = %Error::channel(e), "publish failed; retrying");
                let retry = due.saturating_add(to_millis(self.config.chunk_delay()).max(1));
                self.schedule(retry, Timer::Publish(index));
            }
        }
    }

    fn poll(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        for sender in session.pending_senders() {
            for index in session.indices_to_probe(sender) {
                let key = channel_key(&self.namespace, sender, index);
                let text = match self.channel.fetch(&key) {
                    Ok(Some(text)) => text,
                    Ok(None) => continue,
                    Err(e) => {
                        debug!(%key, error = %Error::channel(e), "fetch failed");
                        continue;
                    }
                };
                match session.offer(sender, index, &text) {
                    AcceptOutcome::Completed => {
                        debug!(%sender, "sender complete");
                    }
                    AcceptOutcome::Rejected(reason) => {
                        debug!(%key, %reason, "dropping sync message");
                    }
                    AcceptOutcome::Stored | AcceptOutcome::Duplicate => {}
                }
            }
        }
    }

    fn ready_to_finish_early(&self) -> bool {
        self.config.finish_when_all_complete
            && self.state == SyncState::Collecting
            && self.session.as_ref().is_some_and(SyncSession::all_complete)
    }

    fn finish(&mut self, early: bool) -> Option<SyncOutcome> {
        if self.finished {
            return None;
        }
        self.finished = true;
        self.timers.clear();
        self.state = SyncState::Completed;
        let session = self.session.take()?;

        let mut report = SyncReport {
            published_chunks: self.published,
            incomplete_senders: session.pending_senders(),
            rejected_messages: session.rejected_count(),
            finished_early: early,
            ..SyncReport::default()
        };
        let mut records = Vec::new();
        for (sender, record) in session.reassemble() {
            match record {
                Some(record) => {
                    report.complete_senders.push(sender);
                    records.push(record);
                }
                None => {
                    warn!(%sender, "complete chunk set did not decode");
                    report.incomplete_senders.push(sender);
                    report.rejected_messages += 1;
                }
            }
        }
        records.extend(self.local_record.take());
        report.merged_records = records.len();

        report.merge = match self.ledger.merge(records) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(
                    path = %self.ledger.path().display(),
                    error = %Error::from(e),
                    "ledger merge failed"
                );
                None
            }
        };
        info!(
            slot = %self.local_slot,
            complete = report.complete_senders.len(),
            incomplete = report.incomplete_senders.len(),
            rejected = report.rejected_messages,
            early,
            "rating sync completed"
        );
        Some(SyncOutcome::Completed(report))
    }
}
