//! Aggregate ledger of every other player's rating seen by this client
//!
//! The ledger is merged last-writer-wins on `last_updated`: an incoming record
//! replaces the stored one only if it is strictly newer. Ties keep what is
//! already stored, so replaying the same exchange never churns the file.

use crate::format::{self, parse_unsigned, Document};
use crate::layout::{write_atomic, StorageLayout};
use crate::{cipher, Corruption, Result};
use rankwire_core::checksum::ledger_checksum;
use rankwire_core::{PlayerRatingRecord, PlayerTag, RatingConfig};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What a single merge step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Identity was not in the ledger
    Inserted,
    /// Incoming record was strictly newer
    Replaced,
    /// Stored record was newer or equally new
    Kept,
}

/// Totals for one [`LedgerStore::merge`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub inserted: usize,
    pub replaced: usize,
    pub kept: usize,
    /// Ledger size after the merge
    pub total: usize,
}

impl MergeSummary {
    fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Inserted => self.inserted += 1,
            MergeOutcome::Replaced => self.replaced += 1,
            MergeOutcome::Kept => self.kept += 1,
        }
    }

    /// Whether the merge changed anything
    pub fn changed(&self) -> bool {
        self.inserted + self.replaced > 0
    }
}

/// In-memory ledger, keyed and ordered by identity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    records: BTreeMap<PlayerTag, PlayerRatingRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-writer-wins merge of one record
    ///
    /// The record is stored truncated and without any pending block.
    pub fn merge_record(&mut self, incoming: PlayerRatingRecord) -> MergeOutcome {
        let incoming = incoming.without_pending().truncated();
        match self.records.get_mut(&incoming.identity) {
            None => {
                self.records.insert(incoming.identity.clone(), incoming);
                MergeOutcome::Inserted
            }
            Some(existing) if incoming.last_updated > existing.last_updated => {
                *existing = incoming;
                MergeOutcome::Replaced
            }
            Some(_) => MergeOutcome::Kept,
        }
    }

    pub fn get(&self, identity: &PlayerTag) -> Option<&PlayerRatingRecord> {
        self.records.get(identity)
    }

    /// Records in identity order
    pub fn iter(&self) -> impl Iterator<Item = &PlayerRatingRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn checksum(&self) -> u32 {
        ledger_checksum(self.records.values())
    }
}

impl FromIterator<PlayerRatingRecord> for Ledger {
    fn from_iter<I: IntoIterator<Item = PlayerRatingRecord>>(iter: I) -> Self {
        let mut ledger = Ledger::new();
        for record in iter {
            ledger.merge_record(record);
        }
        ledger
    }
}

/// Persists the [`Ledger`]
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
    season_id: u32,
    encrypt: bool,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>, season_id: u32, encrypt: bool) -> Self {
        Self {
            path: path.into(),
            season_id,
            encrypt,
        }
    }

    pub fn from_config(layout: &StorageLayout, config: &RatingConfig) -> Self {
        Self::new(layout.ledger_path(), layout.season_id(), config.encryption_enabled)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored ledger; empty when the file is absent or corrupt
    pub fn load(&self) -> Ledger {
        match self.verify() {
            Ok(ledger) => ledger.unwrap_or_default(),
            Err(reason) => {
                warn!(path = %self.path.display(), %reason, "discarding ledger file");
                Ledger::new()
            }
        }
    }

    /// Like [`load`](Self::load), but report why a present file was rejected
    pub fn verify(&self) -> std::result::Result<Option<Ledger>, Corruption> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Corruption::Unreadable(e.to_string())),
        };
        if raw.is_empty() {
            return Ok(None);
        }
        let text = if self.encrypt {
            cipher::decode(&raw).ok_or(Corruption::Decrypt)?
        } else {
            raw
        };
        self.parse(&text).map(Some)
    }

    fn parse(&self, text: &str) -> std::result::Result<Ledger, Corruption> {
        let doc = Document::split(text)?;
        let header = doc.header(self.season_id)?;
        if doc.pending.is_some() {
            return Err(Corruption::UnknownKey("pending".into()));
        }
        let count = doc.count.ok_or(Corruption::MissingKey("count"))?;
        let count = parse_unsigned(count).ok_or(Corruption::BadField("count"))? as usize;
        if count != doc.players.len() {
            return Err(Corruption::CountMismatch {
                expected: count,
                found: doc.players.len(),
            });
        }

        let mut records = BTreeMap::new();
        for line in &doc.players {
            let record = format::parse_player(line)?;
            if records.insert(record.identity.clone(), record).is_some() {
                return Err(Corruption::DuplicateKey("player"));
            }
        }
        let ledger = Ledger { records };

        let computed = ledger.checksum();
        if computed != header.checksum {
            return Err(Corruption::ChecksumMismatch {
                stored: header.checksum,
                computed,
            });
        }
        Ok(ledger)
    }

    /// Render the file body, before optional obfuscation
    pub fn render(&self, ledger: &Ledger) -> String {
        let mut lines = Vec::with_capacity(ledger.len() + 4);
        format::render_header(&mut lines, self.season_id, ledger.checksum());
        lines.push(format!("count:{}", ledger.len()));
        lines.extend(ledger.iter().map(format::render_player));
        lines.join("\n")
    }

    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        let body = self.render(ledger);
        let contents = if self.encrypt {
            cipher::encode(&body)
        } else {
            body
        };
        write_atomic(&self.path, &contents)?;
        debug!(path = %self.path.display(), records = ledger.len(), "ledger written");
        Ok(())
    }

    /// Merge `records` into the stored ledger and persist the result
    ///
    /// The file is written when something changed or when the stored file was
    /// rejected, so a corrupt ledger never outlives a merge. An absent ledger
    /// comes into existence on the first merge that contributes a record.
    pub fn merge<I>(&self, records: I) -> Result<MergeSummary>
    where
        I: IntoIterator<Item = PlayerRatingRecord>,
    {
        let (mut ledger, rejected) = match self.verify() {
            Ok(ledger) => (ledger.unwrap_or_default(), false),
            Err(reason) => {
                warn!(path = %self.path.display(), %reason, "discarding ledger file");
                (Ledger::new(), true)
            }
        };
        let mut summary = MergeSummary::default();
        for record in records {
            summary.record(ledger.merge_record(record));
        }
        summary.total = ledger.len();
        if summary.changed() || rejected {
            self.save(&ledger)?;
        }
        info!(
            inserted = summary.inserted,
            replaced = summary.replaced,
            kept = summary.kept,
            total = summary.total,
            "ledger merged"
        );
        Ok(summary)
    }

    /// Stored record for `identity`, for display
    pub fn lookup(&self, identity: &PlayerTag) -> Option<PlayerRatingRecord> {
        self.load().get(identity).cloned()
    }

    /// Every stored record in identity order, for display
    pub fn entries(&self) -> Vec<PlayerRatingRecord> {
        self.load().iter().cloned().collect()
    }
}
