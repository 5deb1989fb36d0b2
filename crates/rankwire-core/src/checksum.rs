//! Integrity checksums for persisted rating data
//!
//! All checksums are built from one primitive, [`rolling_hash`], a 32-bit
//! multiply-add hash over UTF-16 code units. Inputs are canonical strings in
//! which every numeric field has been floored (see [`crate::canonical_number`]),
//! so two implementations agree on a checksum as long as they agree on the
//! canonical form.
//!
//! # Example
//!
//! ```
//! use rankwire_core::checksum::{record_checksum, rolling_hash};
//! use rankwire_core::{PlayerRatingRecord, PlayerTag};
//!
//! assert_eq!(rolling_hash(""), 0);
//! assert_eq!(rolling_hash("a"), 97);
//!
//! let mut record = PlayerRatingRecord::new(PlayerTag::new("p1").unwrap(), 0);
//! let before = record_checksum(&record);
//! record.rating += 0.5; // floored away
//! assert_eq!(record_checksum(&record), before);
//! record.rating += 1.0;
//! assert_ne!(record_checksum(&record), before);
//! ```

use crate::record::{canonical_number, PendingGameRecord, PlayerRatingRecord, RatingSnapshot};

/// Separator between fields of one canonical record
pub const FIELD_DELIMITER: char = '|';

/// Separator between records of a canonical collection
pub const RECORD_DELIMITER: char = ';';

/// `hash = hash * 31 + unit`, wrapped to signed 32 bits, absolute value
///
/// `i32::MIN` has no positive counterpart in 32 signed bits, so the result is
/// returned as `u32` and that case maps to `2147483648`.
pub fn rolling_hash(input: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in input.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    hash.unsigned_abs()
}

/// Text form of the optional display-preference flag
pub fn flag_text(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "1",
        Some(false) => "0",
        None => "-",
    }
}

fn push_snapshot(out: &mut Vec<String>, snapshot: &RatingSnapshot) {
    out.push(canonical_number(snapshot.rating));
    out.push(snapshot.games_played.to_string());
    out.push(snapshot.last_updated.to_string());
    out.push(snapshot.wins.to_string());
    out.push(snapshot.losses.to_string());
    out.push(snapshot.total_kill_value.to_string());
    out.push(snapshot.total_death_value.to_string());
    out.push(snapshot.total_placement.to_string());
}

fn push_pending(out: &mut Vec<String>, pending: &PendingGameRecord) {
    out.push(pending.attempt_id.clone());
    out.push(pending.marker.to_string());
    push_snapshot(out, &pending.snapshot);
}

/// Canonical string of a record, including its pending block when present
pub fn record_canonical(record: &PlayerRatingRecord) -> String {
    let mut fields = vec![record.identity.as_str().to_string()];
    push_snapshot(&mut fields, &record.snapshot());
    fields.push(flag_text(record.show_rating).to_string());
    if let Some(pending) = &record.pending {
        push_pending(&mut fields, pending);
    }
    fields.join(&FIELD_DELIMITER.to_string())
}

/// Checksum of a single record
pub fn record_checksum(record: &PlayerRatingRecord) -> u32 {
    rolling_hash(&record_canonical(record))
}

/// Checksum of a record collection, independent of input order
///
/// Records are sorted by identity before hashing.
pub fn ledger_checksum<'a, I>(records: I) -> u32
where
    I: IntoIterator<Item = &'a PlayerRatingRecord>,
{
    let mut sorted: Vec<&PlayerRatingRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| a.identity.cmp(&b.identity));
    let joined = sorted
        .into_iter()
        .map(record_canonical)
        .collect::<Vec<_>>()
        .join(&RECORD_DELIMITER.to_string());
    rolling_hash(&joined)
}

/// File-name salt derived from a season-reset key; `None` for an empty key
pub fn salt_for(reset_key: &str) -> Option<u32> {
    if reset_key.is_empty() {
        None
    } else {
        Some(rolling_hash(reset_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlayerTag;

    fn record(identity: &str, rating: f64, last_updated: i64) -> PlayerRatingRecord {
        let mut r = PlayerRatingRecord::new(PlayerTag::new(identity).unwrap(), last_updated);
        r.rating = rating;
        r
    }

    #[test]
    fn test_rolling_hash_known_values() {
        assert_eq!(rolling_hash(""), 0);
        assert_eq!(rolling_hash("a"), 97);
        // 97 * 31 + 98
        assert_eq!(rolling_hash("ab"), 3105);
        // Java's String.hashCode("hello") is 99162322
        assert_eq!(rolling_hash("hello"), 99_162_322);
    }

    #[test]
    fn test_rolling_hash_absolute_value() {
        // "polygenelubricants".hashCode() == Integer.MIN_VALUE
        assert_eq!(rolling_hash("polygenelubricants"), 2_147_483_648);
        // Wraps to -1910022912
        assert_eq!(rolling_hash("zzzzzzzz"), 1_910_022_912);
    }

    #[test]
    fn test_rolling_hash_utf16_units() {
        // U+1F600 is two UTF-16 units: 0xD83D 0xDE00
        assert_eq!(rolling_hash("\u{1F600}"), 0xD83D * 31 + 0xDE00);
    }

    #[test]
    fn test_record_canonical_layout() {
        let mut r = record("p1", 1500.7, 100);
        r.wins = 2;
        assert_eq!(record_canonical(&r), "p1|1500|0|100|2|0|0|0|0|-");

        r.show_rating = Some(false);
        r.pending = Some(PendingGameRecord {
            attempt_id: "m9".into(),
            snapshot: r.snapshot(),
            marker: 3,
        });
        assert_eq!(
            record_canonical(&r),
            "p1|1500|0|100|2|0|0|0|0|0|m9|3|1500|0|100|2|0|0|0|0"
        );
    }

    #[test]
    fn test_record_checksum_floors_rating() {
        let a = record("p1", 1500.1, 1);
        let b = record("p1", 1500.9, 1);
        let c = record("p1", 1501.0, 1);
        assert_eq!(record_checksum(&a), record_checksum(&b));
        assert_ne!(record_checksum(&a), record_checksum(&c));
    }

    #[test]
    fn test_record_checksum_non_finite() {
        let nan = record("p1", f64::NAN, 1);
        assert_eq!(record_canonical(&nan), "p1|NaN|0|1|0|0|0|0|0|-");
        let neg = record("p1", -0.25, 1);
        assert_eq!(record_canonical(&neg), "p1|-1|0|1|0|0|0|0|0|-");
    }

    #[test]
    fn test_ledger_checksum_order_independent() {
        let a = record("alpha", 1500.0, 1);
        let b = record("bravo", 1600.0, 2);
        assert_eq!(ledger_checksum([&a, &b]), ledger_checksum([&b, &a]));
        assert_ne!(ledger_checksum([&a, &b]), ledger_checksum([&a]));
    }

    #[test]
    fn test_salt_for() {
        assert_eq!(salt_for(""), None);
        assert_eq!(salt_for("a"), Some(97));
    }
}
