//! Shared key-value channel between peers
//!
//! Peers never talk to each other directly. Each one writes its envelopes under
//! its own keys and reads everyone else's. Entries are only ever overwritten,
//! never deleted, so republishing a key is idempotent.
//!
//! Implement [`BroadcastChannel`] for whatever store the session host offers.
//! Two implementations ship here:
//! - [`MemoryChannel`] - a cloneable handle over one shared map (single process)
//! - [`DirectoryChannel`] - one file per key under a shared directory

use rankwire_core::SlotId;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Keyed text store shared by every peer in a match
pub trait BroadcastChannel: Send + Sync {
    /// Error type for this channel
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store `value` under `key`, replacing any previous value
    fn publish(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Read the value under `key`
    ///
    /// Returns `Ok(None)` if nothing has been published there yet.
    fn fetch(&self, key: &str) -> Result<Option<String>, Self::Error>;
}

/// Key a sender's chunk is published under
pub fn channel_key(namespace: &str, sender: SlotId, chunk_index: usize) -> String {
    format!("{}/{}/{}", namespace, sender, chunk_index)
}

/// In-process channel; clones share the same entries
#[derive(Debug, Clone, Default)]
pub struct MemoryChannel {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // Entries are plain strings; a panicked writer cannot leave them torn
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of keys published so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl BroadcastChannel for MemoryChannel {
    type Error = Infallible;

    fn publish(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn fetch(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.lock().get(key).cloned())
    }
}

/// Channel backed by a directory several processes can see
///
/// Each key maps to a file named by the hex encoding of the key, so any key
/// text is a valid file name. Values are written to a process-private temp
/// file first and renamed into place.
#[derive(Debug, Clone)]
pub struct DirectoryChannel {
    dir: PathBuf,
}

impl DirectoryChannel {
    /// Open (creating if needed) the shared directory
    pub fn open(dir: impl Into<PathBuf>) -> crate::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(hex::encode(key))
    }
}

impl BroadcastChannel for DirectoryChannel {
    type Error = io::Error;

    fn publish(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let name = hex::encode(key);
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", name, std::process::id()));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.dir.join(name))
    }

    fn fetch(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.entry_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: u32) -> SlotId {
        SlotId::new(n).unwrap()
    }

    #[test]
    fn test_channel_key_format() {
        assert_eq!(channel_key("match-9", slot(4), 12), "match-9/4/12");
    }

    #[test]
    fn test_memory_channel_clones_share_entries() {
        let a = MemoryChannel::new();
        let b = a.clone();
        assert!(b.is_empty());
        a.publish("k", "v1").unwrap();
        assert_eq!(b.fetch("k").unwrap(), Some("v1".to_string()));
        b.publish("k", "v2").unwrap();
        assert_eq!(a.fetch("k").unwrap(), Some("v2".to_string()));
        assert_eq!(a.len(), 1);
        assert_eq!(a.fetch("missing").unwrap(), None);
    }

    #[test]
    fn test_directory_channel_shared_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DirectoryChannel::open(dir.path().join("bus")).unwrap();
        let reader = DirectoryChannel::open(writer.dir()).unwrap();

        let key = channel_key("m/1", slot(2), 0);
        assert_eq!(reader.fetch(&key).unwrap(), None);
        writer.publish(&key, "RWSYNC|2|0/1|QUJD").unwrap();
        assert_eq!(
            reader.fetch(&key).unwrap().as_deref(),
            Some("RWSYNC|2|0/1|QUJD")
        );

        // Republishing overwrites in place and leaves no temp files behind
        writer.publish(&key, "RWSYNC|2|0/1|QUJE").unwrap();
        assert_eq!(
            reader.fetch(&key).unwrap().as_deref(),
            Some("RWSYNC|2|0/1|QUJE")
        );
        assert_eq!(fs::read_dir(writer.dir()).unwrap().count(), 1);
    }
}
