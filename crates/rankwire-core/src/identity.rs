//! Identity types for players and match slots

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of player slots a match can have
pub const MAX_SLOTS: u8 = 24;

/// Stable tag identifying a player across matches and seasons
///
/// Never empty and free of control characters. The tag is used verbatim as
/// the ledger key and written on a single line of the persisted files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerTag(String);

impl PlayerTag {
    /// Create a tag, rejecting the empty string and control characters
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(Error::InvalidIdentity("identity tag must not be empty".into()));
        }
        if tag.chars().any(char::is_control) {
            return Err(Error::InvalidIdentity(format!(
                "identity tag {:?} contains a control character",
                tag
            )));
        }
        Ok(Self(tag))
    }

    /// Get the tag as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PlayerTag {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for PlayerTag {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl From<PlayerTag> for String {
    fn from(tag: PlayerTag) -> Self {
        tag.0
    }
}

/// Slot a participant occupies in a match; doubles as the wire sender id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(u8);

impl SlotId {
    /// Create a slot id, rejecting values outside `0..MAX_SLOTS`
    pub fn new(slot: u32) -> Result<Self> {
        if slot < MAX_SLOTS as u32 {
            Ok(Self(slot as u8))
        } else {
            Err(Error::InvalidSlot(slot))
        }
    }

    /// Get the raw slot number
    pub fn raw(&self) -> u8 {
        self.0
    }

    /// Iterate over every valid slot
    pub fn all() -> impl Iterator<Item = SlotId> {
        (0..MAX_SLOTS).map(SlotId)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
