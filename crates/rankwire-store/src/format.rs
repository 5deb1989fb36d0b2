//! Line-oriented `key:value` text shared by rating and ledger files
//!
//! ```text
//! version:1
//! seasonId:4
//! checksum:1736520113
//! count:1                                   (ledger only)
//! player:<identity>:<rating>:<gamesPlayed>:<lastUpdated>:<wins>:<losses>:<kill>:<death>:<placement>:<flag>
//! pending:<attemptId>:<marker>:<rating>:<gamesPlayed>:<lastUpdated>:<wins>:<losses>:<kill>:<death>:<placement>
//! ```
//!
//! The leading identity or attempt id may itself contain `:`, so record lines
//! are split from the right. Parsing is strict: any unknown or repeated key,
//! short line or non-canonical number rejects the whole document.

use crate::Corruption;
use rankwire_core::checksum::flag_text;
use rankwire_core::{
    canonical_number, parse_canonical_number, parse_strict_int, PendingGameRecord,
    PlayerRatingRecord, PlayerTag, RatingSnapshot,
};

/// Current file format version
pub const FILE_VERSION: u32 = 1;

/// Fields on a `player:` line
pub const PLAYER_FIELDS: usize = 10;

/// Fields on a `pending:` line
pub const PENDING_FIELDS: usize = 10;

const SEPARATOR: char = ':';

fn snapshot_fields(snapshot: &RatingSnapshot) -> [String; 8] {
    [
        canonical_number(snapshot.rating),
        snapshot.games_played.to_string(),
        snapshot.last_updated.to_string(),
        snapshot.wins.to_string(),
        snapshot.losses.to_string(),
        snapshot.total_kill_value.to_string(),
        snapshot.total_death_value.to_string(),
        snapshot.total_placement.to_string(),
    ]
}

pub(crate) fn render_header(out: &mut Vec<String>, season_id: u32, checksum: u32) {
    out.push(format!("version:{}", FILE_VERSION));
    out.push(format!("seasonId:{}", season_id));
    out.push(format!("checksum:{}", checksum));
}

pub(crate) fn render_player(record: &PlayerRatingRecord) -> String {
    let mut fields = vec![record.identity.as_str().to_string()];
    fields.extend(snapshot_fields(&record.snapshot()));
    fields.push(flag_text(record.show_rating).to_string());
    format!("player:{}", fields.join(":"))
}

pub(crate) fn render_pending(pending: &PendingGameRecord) -> String {
    let mut fields = vec![pending.attempt_id.clone(), pending.marker.to_string()];
    fields.extend(snapshot_fields(&pending.snapshot));
    format!("pending:{}", fields.join(":"))
}

/// Split a record line into exactly `n` fields, the first absorbing extra separators
fn split_fields(value: &str, n: usize) -> Option<Vec<&str>> {
    let mut fields: Vec<&str> = value.rsplitn(n, SEPARATOR).collect();
    if fields.len() != n {
        return None;
    }
    fields.reverse();
    Some(fields)
}

fn parse_snapshot(fields: &[&str]) -> Result<RatingSnapshot, Corruption> {
    let int = |i: usize, name: &'static str| {
        parse_strict_int(fields[i]).ok_or(Corruption::BadField(name))
    };
    Ok(RatingSnapshot {
        rating: parse_canonical_number(fields[0]).ok_or(Corruption::BadField("rating"))?,
        games_played: int(1, "gamesPlayed")?,
        last_updated: int(2, "lastUpdated")?,
        wins: int(3, "wins")?,
        losses: int(4, "losses")?,
        total_kill_value: int(5, "totalKillValue")?,
        total_death_value: int(6, "totalDeathValue")?,
        total_placement: int(7, "totalPlacement")?,
    })
}

pub(crate) fn parse_player(value: &str) -> Result<PlayerRatingRecord, Corruption> {
    let fields = split_fields(value, PLAYER_FIELDS).ok_or(Corruption::BadField("player"))?;
    let identity = PlayerTag::new(fields[0]).map_err(|_| Corruption::BadField("identity"))?;
    let snapshot = parse_snapshot(&fields[1..9])?;
    let show_rating = match fields[9] {
        "1" => Some(true),
        "0" => Some(false),
        "-" => None,
        _ => return Err(Corruption::BadField("showRating")),
    };
    let mut record =
        PlayerRatingRecord::new(identity, snapshot.last_updated).with_snapshot(&snapshot);
    record.show_rating = show_rating;
    Ok(record)
}

pub(crate) fn parse_pending(value: &str) -> Result<PendingGameRecord, Corruption> {
    let fields = split_fields(value, PENDING_FIELDS).ok_or(Corruption::BadField("pending"))?;
    if fields[0].is_empty() {
        return Err(Corruption::BadField("attemptId"));
    }
    Ok(PendingGameRecord {
        attempt_id: fields[0].to_string(),
        marker: parse_strict_int(fields[1]).ok_or(Corruption::BadField("marker"))?,
        snapshot: parse_snapshot(&fields[2..])?,
    })
}

/// The raw entries of a document, before any field is interpreted
#[derive(Debug, Default)]
pub(crate) struct Document<'a> {
    version: Option<&'a str>,
    season_id: Option<&'a str>,
    checksum: Option<&'a str>,
    pub count: Option<&'a str>,
    pub pending: Option<&'a str>,
    pub players: Vec<&'a str>,
}

/// Validated header fields
#[derive(Debug, Clone, Copy)]
pub(crate) struct Header {
    pub checksum: u32,
}

impl<'a> Document<'a> {
    pub fn split(text: &'a str) -> Result<Self, Corruption> {
        let mut doc = Document::default();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once(SEPARATOR)
                .ok_or_else(|| Corruption::MalformedLine(line.to_string()))?;
            let (name, slot) = match key {
                "version" => ("version", &mut doc.version),
                "seasonId" => ("seasonId", &mut doc.season_id),
                "checksum" => ("checksum", &mut doc.checksum),
                "count" => ("count", &mut doc.count),
                "pending" => ("pending", &mut doc.pending),
                "player" => {
                    doc.players.push(value);
                    continue;
                }
                other => return Err(Corruption::UnknownKey(other.to_string())),
            };
            if slot.replace(value).is_some() {
                return Err(Corruption::DuplicateKey(name));
            }
        }
        Ok(doc)
    }

    /// Check version and season, and return the stored checksum
    pub fn header(&self, expected_season: u32) -> Result<Header, Corruption> {
        let version = self.version.ok_or(Corruption::MissingKey("version"))?;
        if parse_strict_int(version) != Some(i64::from(FILE_VERSION)) {
            return Err(Corruption::Version(version.to_string()));
        }
        let season = self.season_id.ok_or(Corruption::MissingKey("seasonId"))?;
        let season = parse_unsigned(season).ok_or(Corruption::BadField("seasonId"))?;
        if season != expected_season {
            return Err(Corruption::SeasonMismatch {
                expected: expected_season,
                found: season,
            });
        }
        let checksum = self.checksum.ok_or(Corruption::MissingKey("checksum"))?;
        let checksum = parse_unsigned(checksum).ok_or(Corruption::BadField("checksum"))?;
        Ok(Header { checksum })
    }
}

/// Parse a plain run of ASCII digits
pub(crate) fn parse_unsigned(text: &str) -> Option<u32> {
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        text.parse().ok()
    } else {
        None
    }
}
