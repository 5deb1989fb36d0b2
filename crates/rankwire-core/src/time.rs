//! Wall-clock and logical time
//!
//! - `Timestamp` - milliseconds since the Unix epoch, stamped on records
//! - `Millis` - logical milliseconds used to drive sync timers

use chrono::Utc;
use std::time::Duration;

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Logical time in milliseconds, as seen by a timer-driven component
pub type Millis = u64;

/// Current wall-clock time as a [`Timestamp`]
pub fn now() -> Timestamp {
    Utc::now().timestamp_millis()
}

/// Convert a duration to whole logical milliseconds, saturating
pub fn to_millis(duration: Duration) -> Millis {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(now() > 1_577_836_800_000);
    }

    #[test]
    fn test_to_millis() {
        assert_eq!(to_millis(Duration::from_secs(2)), 2000);
        assert_eq!(to_millis(Duration::from_micros(1500)), 1);
        assert_eq!(to_millis(Duration::MAX), u64::MAX);
    }
}
