//! Rating and sync configuration
//!
//! Loaded from RON. Every field has a default so a partial file (or an empty
//! `()`) is a valid configuration.
//!
//! ```ron
//! (
//!     sync_enabled: true,
//!     sync_timeout_secs: 10.0,
//!     max_chunk_size: 200,
//!     season_id: 4,
//!     season_reset_key: "spring-reset",
//! )
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Configuration for rating persistence and peer sync
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RatingConfig {
    /// Master switch for the match-start exchange
    #[serde(default = "default_true")]
    pub sync_enabled: bool,
    /// Collection deadline, measured from `start_sync`
    #[serde(default = "default_sync_timeout")]
    pub sync_timeout_secs: f64,
    /// Pause between successive chunk publications
    #[serde(default = "default_chunk_delay")]
    pub chunk_delay_secs: f64,
    /// Period of the Collecting poll
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: f64,
    /// Characters per chunk
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    /// Candidate chunk indices probed per sender before its count is known
    #[serde(default = "default_probe_chunk_limit")]
    pub probe_chunk_limit: usize,
    /// Finish as soon as every expected sender is complete instead of
    /// waiting out the deadline
    #[serde(default)]
    pub finish_when_all_complete: bool,
    /// Season partition key
    #[serde(default = "default_season_id")]
    pub season_id: u32,
    /// Obfuscate files with the stream cipher
    #[serde(default = "default_true")]
    pub encryption_enabled: bool,
    /// Salts file names so a season can be reset without a new season id
    #[serde(default)]
    pub season_reset_key: String,
}

fn default_true() -> bool {
    true
}

fn default_sync_timeout() -> f64 {
    10.0
}

fn default_chunk_delay() -> f64 {
    0.1
}

fn default_poll_interval() -> f64 {
    0.5
}

fn default_max_chunk_size() -> usize {
    200
}

fn default_probe_chunk_limit() -> usize {
    64
}

fn default_season_id() -> u32 {
    1
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            sync_enabled: true,
            sync_timeout_secs: default_sync_timeout(),
            chunk_delay_secs: default_chunk_delay(),
            poll_interval_secs: default_poll_interval(),
            max_chunk_size: default_max_chunk_size(),
            probe_chunk_limit: default_probe_chunk_limit(),
            finish_when_all_complete: false,
            season_id: default_season_id(),
            encryption_enabled: true,
            season_reset_key: String::new(),
        }
    }
}

impl RatingConfig {
    /// Parse and validate a RON document
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Reject durations that cannot be scheduled
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("sync_timeout_secs", self.sync_timeout_secs),
            ("chunk_delay_secs", self.chunk_delay_secs),
            ("poll_interval_secs", self.poll_interval_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn sync_timeout(&self) -> Duration {
        secs(self.sync_timeout_secs)
    }

    pub fn chunk_delay(&self) -> Duration {
        secs(self.chunk_delay_secs)
    }

    /// Poll period; never zero, so a poll timer always makes progress
    pub fn poll_interval(&self) -> Duration {
        secs(self.poll_interval_secs).max(Duration::from_millis(1))
    }

    /// Chunk size clamped to at least one character
    pub fn chunk_size(&self) -> usize {
        self.max_chunk_size.max(1)
    }

    /// Probe limit clamped to at least one index
    pub fn probe_limit(&self) -> usize {
        self.probe_chunk_limit.max(1)
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = RatingConfig::from_ron_str("()").unwrap();
        assert_eq!(config, RatingConfig::default());
        assert!(config.sync_enabled);
        assert!(config.encryption_enabled);
        assert_eq!(config.chunk_size(), 200);
        assert_eq!(config.sync_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_document() {
        let config = RatingConfig::from_ron_str(
            r#"(sync_enabled: false, max_chunk_size: 0, season_id: 7, season_reset_key: "r2")"#,
        )
        .unwrap();
        assert!(!config.sync_enabled);
        assert_eq!(config.season_id, 7);
        assert_eq!(config.season_reset_key, "r2");
        // Zero is clamped
        assert_eq!(config.chunk_size(), 1);
        assert_eq!(config.chunk_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_rejects_negative_duration() {
        let err = RatingConfig::from_ron_str("(sync_timeout_secs: -1.0)").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_ron() {
        let err = RatingConfig::from_ron_str("(sync_enabled: )").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_poll_interval_never_zero() {
        let config = RatingConfig {
            poll_interval_secs: 0.0,
            ..Default::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rating.ron");
        fs::write(&path, "(season_id: 3, encryption_enabled: false)").unwrap();
        let config = RatingConfig::load(&path).unwrap();
        assert_eq!(config.season_id, 3);
        assert!(!config.encryption_enabled);

        let missing = RatingConfig::load(dir.path().join("absent.ron")).unwrap_err();
        assert!(matches!(missing, Error::Io(_)));
    }
}
