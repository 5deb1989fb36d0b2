//! Player rating records and numeric canonicalisation
//!
//! Every numeric field is floored to an integer before it is hashed, written
//! to disk or put on the wire. Only `rating` may carry a fraction in memory.
//! The canonical text form of a floored number is part of the checksum
//! algorithm and must not change: `NaN`, `Infinity` and `-Infinity` render
//! literally and negative zero renders as `0`.

use crate::time::Timestamp;
use crate::PlayerTag;
use serde::{Deserialize, Serialize};

/// Rating assigned to a player seen for the first time
pub const DEFAULT_RATING: f64 = 1500.0;

/// The numeric fields of a rating record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    pub rating: f64,
    pub games_played: i64,
    pub last_updated: Timestamp,
    pub wins: i64,
    pub losses: i64,
    pub total_kill_value: i64,
    pub total_death_value: i64,
    pub total_placement: i64,
}

impl RatingSnapshot {
    /// Copy with `rating` floored
    pub fn truncated(&self) -> Self {
        Self {
            rating: floor_rating(self.rating),
            ..self.clone()
        }
    }
}

/// An uncommitted, tentative update written mid-match
///
/// Left behind if the client dies before the end-of-match write; cleared
/// once the authoritative record is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingGameRecord {
    /// Unique id of the match attempt that produced this delta
    pub attempt_id: String,
    /// Prospective values after the match
    pub snapshot: RatingSnapshot,
    /// Turn or timestamp at which the delta was staged
    pub marker: i64,
}

impl PendingGameRecord {
    /// Record that would result from committing this delta
    pub fn apply_to(&self, record: &PlayerRatingRecord) -> PlayerRatingRecord {
        let mut applied = record.with_snapshot(&self.snapshot);
        applied.pending = None;
        applied
    }
}

/// One player's persisted rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRatingRecord {
    pub identity: PlayerTag,
    pub rating: f64,
    pub games_played: i64,
    pub last_updated: Timestamp,
    pub wins: i64,
    pub losses: i64,
    pub total_kill_value: i64,
    pub total_death_value: i64,
    pub total_placement: i64,
    pub pending: Option<PendingGameRecord>,
    pub show_rating: Option<bool>,
}

impl PlayerRatingRecord {
    /// First-time defaults for a player with no stored record
    pub fn new(identity: PlayerTag, now: Timestamp) -> Self {
        Self {
            identity,
            rating: DEFAULT_RATING,
            games_played: 0,
            last_updated: now,
            wins: 0,
            losses: 0,
            total_kill_value: 0,
            total_death_value: 0,
            total_placement: 0,
            pending: None,
            show_rating: None,
        }
    }

    /// The numeric fields as a snapshot
    pub fn snapshot(&self) -> RatingSnapshot {
        RatingSnapshot {
            rating: self.rating,
            games_played: self.games_played,
            last_updated: self.last_updated,
            wins: self.wins,
            losses: self.losses,
            total_kill_value: self.total_kill_value,
            total_death_value: self.total_death_value,
            total_placement: self.total_placement,
        }
    }

    /// Copy of this record with the numeric fields replaced
    pub fn with_snapshot(&self, snapshot: &RatingSnapshot) -> Self {
        Self {
            identity: self.identity.clone(),
            rating: snapshot.rating,
            games_played: snapshot.games_played,
            last_updated: snapshot.last_updated,
            wins: snapshot.wins,
            losses: snapshot.losses,
            total_kill_value: snapshot.total_kill_value,
            total_death_value: snapshot.total_death_value,
            total_placement: snapshot.total_placement,
            pending: self.pending.clone(),
            show_rating: self.show_rating,
        }
    }

    /// Copy with every numeric field in its canonical, floored form
    pub fn truncated(&self) -> Self {
        let mut out = self.clone();
        out.rating = floor_rating(self.rating);
        if let Some(pending) = out.pending.as_mut() {
            pending.snapshot = pending.snapshot.truncated();
        }
        out
    }

    /// Copy without the pending block
    pub fn without_pending(&self) -> Self {
        Self {
            pending: None,
            ..self.clone()
        }
    }
}

fn floor_rating(rating: f64) -> f64 {
    if rating.is_finite() {
        rating.floor()
    } else {
        rating
    }
}

/// Canonical text of a floored number
///
/// # Example
///
/// ```
/// use rankwire_core::canonical_number;
///
/// assert_eq!(canonical_number(1523.9), "1523");
/// assert_eq!(canonical_number(-0.5), "-1");
/// assert_eq!(canonical_number(-0.0), "0");
/// assert_eq!(canonical_number(f64::NAN), "NaN");
/// assert_eq!(canonical_number(f64::NEG_INFINITY), "-Infinity");
/// ```
pub fn canonical_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let floored = value.floor();
    if floored == 0.0 {
        // Covers -0.0
        return "0".to_string();
    }
    format!("{:.0}", floored)
}

/// Parse text produced by [`canonical_number`]
pub fn parse_canonical_number(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ if is_integer_literal(text) => text.parse().ok(),
        _ => None,
    }
}

/// Parse a strictly formatted decimal integer (optional leading `-`, digits only)
pub fn parse_strict_int(text: &str) -> Option<i64> {
    if is_integer_literal(text) {
        text.parse().ok()
    } else {
        None
    }
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Lenient numeric coercion for wire fields
///
/// Non-numeric and non-finite input becomes `0`; anything else is floored.
pub fn coerce_number(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v.floor(),
        _ => 0.0,
    }
}

/// [`coerce_number`] narrowed to an integer field (saturating)
pub fn coerce_int(text: &str) -> i64 {
    coerce_number(text) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> PlayerTag {
        PlayerTag::new(s).unwrap()
    }

    #[test]
    fn test_new_record_defaults() {
        let record = PlayerRatingRecord::new(tag("p1"), 42);
        assert_eq!(record.rating, DEFAULT_RATING);
        assert_eq!(record.games_played, 0);
        assert_eq!(record.last_updated, 42);
        assert!(record.pending.is_none());
        assert!(record.show_rating.is_none());
    }

    #[test]
    fn test_canonical_number() {
        assert_eq!(canonical_number(0.0), "0");
        assert_eq!(canonical_number(-0.0), "0");
        assert_eq!(canonical_number(1500.99), "1500");
        assert_eq!(canonical_number(-2.5), "-3");
        assert_eq!(canonical_number(f64::NAN), "NaN");
        assert_eq!(canonical_number(f64::INFINITY), "Infinity");
        assert_eq!(canonical_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(canonical_number(1e21), "1000000000000000000000");
    }

    #[test]
    fn test_parse_canonical_number() {
        assert_eq!(parse_canonical_number("1500"), Some(1500.0));
        assert_eq!(parse_canonical_number("-3"), Some(-3.0));
        assert!(parse_canonical_number("NaN").unwrap().is_nan());
        assert_eq!(parse_canonical_number("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_canonical_number("15.5"), None);
        assert_eq!(parse_canonical_number("+15"), None);
        assert_eq!(parse_canonical_number(""), None);
        assert_eq!(parse_canonical_number("-"), None);
    }

    #[test]
    fn test_parse_strict_int() {
        assert_eq!(parse_strict_int("17"), Some(17));
        assert_eq!(parse_strict_int("-17"), Some(-17));
        assert_eq!(parse_strict_int(" 17"), None);
        assert_eq!(parse_strict_int("+17"), None);
        assert_eq!(parse_strict_int("1e3"), None);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce_number("12.9"), 12.0);
        assert_eq!(coerce_number("-0.5"), -1.0);
        assert_eq!(coerce_number("abc"), 0.0);
        assert_eq!(coerce_number("NaN"), 0.0);
        assert_eq!(coerce_number("inf"), 0.0);
        assert_eq!(coerce_int("7"), 7);
        assert_eq!(coerce_int(""), 0);
    }

    #[test]
    fn test_truncated_floors_rating_only() {
        let mut record = PlayerRatingRecord::new(tag("p1"), 0);
        record.rating = 1612.75;
        record.wins = 3;
        let t = record.truncated();
        assert_eq!(t.rating, 1612.0);
        assert_eq!(t.wins, 3);

        record.rating = f64::INFINITY;
        assert_eq!(record.truncated().rating, f64::INFINITY);
    }

    #[test]
    fn test_pending_apply_to() {
        let mut record = PlayerRatingRecord::new(tag("p1"), 10);
        record.show_rating = Some(true);
        let mut snapshot = record.snapshot();
        snapshot.rating = 1530.0;
        snapshot.games_played = 1;
        snapshot.wins = 1;
        snapshot.last_updated = 20;
        record.pending = Some(PendingGameRecord {
            attempt_id: "m-1".into(),
            snapshot,
            marker: 5,
        });

        let committed = record.pending.as_ref().unwrap().apply_to(&record);
        assert_eq!(committed.rating, 1530.0);
        assert_eq!(committed.games_played, 1);
        assert_eq!(committed.last_updated, 20);
        assert_eq!(committed.show_rating, Some(true));
        assert!(committed.pending.is_none());
    }
}
