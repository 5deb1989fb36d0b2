//! Wire codec for the rating exchange
//!
//! A record travels as a URL-safe base64 blob, split into bounded chunks, each
//! wrapped in an envelope:
//!
//! ```text
//! RWSYNC|<sender>|<chunkIndex>/<totalChunks>|<payload>
//! ```
//!
//! The URL-safe alphabet (`A-Z a-z 0-9 - _ =`) never contains `|` or `/`, so
//! a payload cannot collide with the envelope delimiters. [`parse`] accepts
//! exactly this grammar and nothing else; anything off-grammar is dropped.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rankwire_core::{
    canonical_number, coerce_int, coerce_number, PlayerRatingRecord, PlayerTag, SlotId,
};
use std::collections::BTreeMap;

/// Type tag opening every envelope
pub const MESSAGE_PREFIX: &str = "RWSYNC";

/// Separates envelope fields
pub const FIELD_DELIMITER: char = '|';

/// Separates chunk index from chunk count
pub const COUNT_DELIMITER: char = '/';

const RECORD_SEPARATOR: char = ':';
const RECORD_FIELDS: usize = 8;

/// One parsed envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMessage {
    pub sender: SlotId,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub payload: String,
}

/// Encode the exchanged subset of a record
///
/// Field order: rating, gamesPlayed, lastUpdated, wins, losses,
/// totalKillValue, totalDeathValue, identity. The rating is floored.
pub fn serialize(record: &PlayerRatingRecord) -> String {
    let plain = [
        canonical_number(record.rating),
        record.games_played.to_string(),
        record.last_updated.to_string(),
        record.wins.to_string(),
        record.losses.to_string(),
        record.total_kill_value.to_string(),
        record.total_death_value.to_string(),
        record.identity.as_str().to_string(),
    ]
    .join(&RECORD_SEPARATOR.to_string());
    URL_SAFE.encode(plain)
}

/// Reverse [`serialize`] with lenient numeric coercion
///
/// Non-numeric fields become `0`. Returns `None` if the blob is not valid
/// base64 / UTF-8, has too few fields, or carries an identity that
/// [`PlayerTag::new`] refuses (empty, or containing control characters).
pub fn deserialize(encoded: &str) -> Option<PlayerRatingRecord> {
    let bytes = URL_SAFE.decode(encoded).ok()?;
    let plain = String::from_utf8(bytes).ok()?;
    let fields: Vec<&str> = plain.splitn(RECORD_FIELDS, RECORD_SEPARATOR).collect();
    if fields.len() != RECORD_FIELDS {
        return None;
    }
    let identity = PlayerTag::new(fields[7]).ok()?;
    let mut record = PlayerRatingRecord::new(identity, coerce_int(fields[2]));
    record.rating = coerce_number(fields[0]);
    record.games_played = coerce_int(fields[1]);
    record.wins = coerce_int(fields[3]);
    record.losses = coerce_int(fields[4]);
    record.total_kill_value = coerce_int(fields[5]);
    record.total_death_value = coerce_int(fields[6]);
    Some(record)
}

/// Split `text` into contiguous pieces of at most `max_size` characters
///
/// A `max_size` of zero is treated as one. Empty input yields no chunks.
pub fn chunk(text: &str, max_size: usize) -> Vec<String> {
    let size = max_size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|piece| piece.iter().collect()).collect()
}

/// Wrap one chunk in an envelope
pub fn envelope(payload: &str, sender: SlotId, chunk_index: usize, total_chunks: usize) -> String {
    format!(
        "{prefix}{d}{sender}{d}{chunk_index}{c}{total_chunks}{d}{payload}",
        prefix = MESSAGE_PREFIX,
        d = FIELD_DELIMITER,
        c = COUNT_DELIMITER,
    )
}

/// Envelope every chunk of an encoded record
pub fn envelopes(encoded: &str, sender: SlotId, max_size: usize) -> Vec<String> {
    let chunks = chunk(encoded, max_size);
    let total = chunks.len();
    chunks
        .iter()
        .enumerate()
        .map(|(i, piece)| envelope(piece, sender, i, total))
        .collect()
}

/// Decimal integer exactly as `envelope` renders it: digits only, no leading zero
fn parse_digits(text: &str) -> Option<usize> {
    let canonical = match text.as_bytes() {
        [b'0'] => true,
        [first, ..] => *first != b'0' && text.bytes().all(|b| b.is_ascii_digit()),
        [] => false,
    };
    if canonical {
        text.parse().ok()
    } else {
        None
    }
}

/// Parse an envelope, or `None` for anything off-grammar
pub fn parse(text: &str) -> Option<SyncMessage> {
    let mut fields = text.split(FIELD_DELIMITER);
    let prefix = fields.next()?;
    let sender = fields.next()?;
    let counts = fields.next()?;
    let payload = fields.next()?;
    if fields.next().is_some() || prefix != MESSAGE_PREFIX {
        return None;
    }

    let sender = u32::try_from(parse_digits(sender)?).ok()?;
    let sender = SlotId::new(sender).ok()?;
    let (index, total) = counts.split_once(COUNT_DELIMITER)?;
    let chunk_index = parse_digits(index)?;
    let total_chunks = parse_digits(total)?;
    if chunk_index >= total_chunks {
        return None;
    }
    if payload.is_empty() || payload.contains(COUNT_DELIMITER) {
        return None;
    }

    Some(SyncMessage {
        sender,
        chunk_index,
        total_chunks,
        payload: payload.to_string(),
    })
}

/// Concatenate a complete chunk set and decode the record
///
/// Succeeds only if `chunks` holds exactly `total_chunks` entries keyed
/// `0..total_chunks`.
pub fn reassemble(
    chunks: &BTreeMap<usize, String>,
    total_chunks: usize,
) -> Option<PlayerRatingRecord> {
    if total_chunks == 0
        || chunks.len() != total_chunks
        || !chunks.keys().copied().eq(0..total_chunks)
    {
        return None;
    }
    let encoded: String = chunks.values().map(String::as_str).collect();
    deserialize(&encoded)
}
