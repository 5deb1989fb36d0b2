//! The local player's own rating file
//!
//! A missing or untrustworthy file never produces an error: [`RecordStore::read`]
//! returns `None`, and every caller treats that as "first time seen".

use crate::format::{self, Document};
use crate::layout::{write_atomic, StorageLayout};
use crate::{cipher, Corruption, Result};
use rankwire_core::checksum::record_checksum;
use rankwire_core::{PendingGameRecord, PlayerRatingRecord, PlayerTag, RatingConfig, Timestamp};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads and writes one player's rating file
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    season_id: u32,
    encrypt: bool,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>, season_id: u32, encrypt: bool) -> Self {
        Self {
            path: path.into(),
            season_id,
            encrypt,
        }
    }

    pub fn from_config(layout: &StorageLayout, config: &RatingConfig) -> Self {
        Self::new(layout.rating_path(), layout.season_id(), config.encryption_enabled)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the file body for `record`, before optional obfuscation
    pub fn render(&self, record: &PlayerRatingRecord) -> String {
        let record = record.truncated();
        let mut lines = Vec::with_capacity(5);
        format::render_header(&mut lines, self.season_id, record_checksum(&record));
        lines.push(format::render_player(&record));
        if let Some(pending) = &record.pending {
            lines.push(format::render_pending(pending));
        }
        lines.join("\n")
    }

    /// Persist `record`; numeric fields are floored on the way out
    pub fn write(&self, record: &PlayerRatingRecord) -> Result<()> {
        let body = self.render(record);
        let contents = if self.encrypt {
            cipher::encode(&body)
        } else {
            body
        };
        write_atomic(&self.path, &contents)?;
        debug!(path = %self.path.display(), identity = %record.identity, "rating file written");
        Ok(())
    }

    /// Load the record, or `None` when it is absent or fails verification
    pub fn read(&self) -> Option<PlayerRatingRecord> {
        match self.verify() {
            Ok(record) => record,
            Err(reason) => {
                warn!(path = %self.path.display(), %reason, "discarding rating file");
                None
            }
        }
    }

    /// Like [`read`](Self::read), but report why a present file was rejected
    pub fn verify(&self) -> std::result::Result<Option<PlayerRatingRecord>, Corruption> {
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

    fn parse(&self, text: &str) -> std::result::Result<PlayerRatingRecord, Corruption> {
        let doc = Document::split(text)?;
        let header = doc.header(self.season_id)?;
        if doc.count.is_some() {
            return Err(Corruption::UnknownKey("count".into()));
        }
        let [player] = doc.players.as_slice() else {
            return Err(Corruption::CountMismatch {
                expected: 1,
                found: doc.players.len(),
            });
        };
        let mut record = format::parse_player(player)?;
        record.pending = doc.pending.map(format::parse_pending).transpose()?;

        let computed = record_checksum(&record);
        if computed != header.checksum {
            return Err(Corruption::ChecksumMismatch {
                stored: header.checksum,
                computed,
            });
        }
        Ok(record)
    }

    /// Stored record, or first-time defaults for `identity`
    pub fn load_or_default(&self, identity: &PlayerTag, now: Timestamp) -> PlayerRatingRecord {
        self.read()
            .unwrap_or_else(|| PlayerRatingRecord::new(identity.clone(), now))
    }

    /// Write a tentative mid-match delta on top of the current record
    ///
    /// A later [`commit`](Self::commit) supersedes it. If the client dies
    /// first, the next [`read`](Self::read) still carries the pending block.
    pub fn stage_pending(
        &self,
        identity: &PlayerTag,
        pending: PendingGameRecord,
        now: Timestamp,
    ) -> Result<PlayerRatingRecord> {
        let mut record = self.load_or_default(identity, now);
        record.pending = Some(pending);
        self.write(&record)?;
        Ok(record)
    }

    /// Write the authoritative end-of-match record, clearing any pending block
    pub fn commit(&self, record: &PlayerRatingRecord) -> Result<PlayerRatingRecord> {
        let committed = record.without_pending();
        self.write(&committed)?;
        Ok(committed.truncated())
    }
}
