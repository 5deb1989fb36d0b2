//! Season-partitioned file naming and atomic writes

use rankwire_core::checksum::salt_for;
use rankwire_core::RatingConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where the rating and ledger files of one season live
///
/// A non-empty season-reset key salts the file names, so changing the key
/// starts every player from scratch without touching the season id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
    season_id: u32,
    salt: Option<u32>,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>, season_id: u32, reset_key: &str) -> Self {
        Self {
            root: root.into(),
            season_id,
            salt: salt_for(reset_key),
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &RatingConfig) -> Self {
        Self::new(root, config.season_id, &config.season_reset_key)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn season_id(&self) -> u32 {
        self.season_id
    }

    /// The local player's own rating file
    pub fn rating_path(&self) -> PathBuf {
        self.root.join(self.file_name("rating"))
    }

    /// The aggregate ledger of other players
    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(self.file_name("ledger"))
    }

    fn file_name(&self, stem: &str) -> String {
        match self.salt {
            Some(salt) => format!("{}_s{}_{:08x}.dat", stem, self.season_id, salt),
            None => format!("{}_s{}.dat", stem, self.season_id),
        }
    }
}

/// Write `contents` to a sibling temp file, then rename it over `path`
pub(crate) fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsalted_names() {
        let layout = StorageLayout::new("/data", 3, "");
        assert_eq!(layout.rating_path(), PathBuf::from("/data/rating_s3.dat"));
        assert_eq!(layout.ledger_path(), PathBuf::from("/data/ledger_s3.dat"));
    }

    #[test]
    fn test_reset_key_salts_names() {
        let plain = StorageLayout::new("/data", 3, "");
        let salted = StorageLayout::new("/data", 3, "a");
        // rolling_hash("a") == 97 == 0x61
        assert_eq!(salted.rating_path(), PathBuf::from("/data/rating_s3_00000061.dat"));
        assert_ne!(plain.ledger_path(), salted.ledger_path());
        assert_ne!(
            StorageLayout::new("/data", 3, "b").rating_path(),
            salted.rating_path()
        );
    }

    #[test]
    fn test_from_config() {
        let config = RatingConfig {
            season_id: 9,
            ..Default::default()
        };
        let layout = StorageLayout::from_config("/d", &config);
        assert_eq!(layout.season_id(), 9);
        assert_eq!(layout.root(), Path::new("/d"));
    }

    #[test]
    fn test_write_atomic_creates_parent_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("file.dat");
        write_atomic(&path, "one").unwrap();
        write_atomic(&path, "two").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
        assert!(!dir.path().join("nested").join("file.dat.tmp").exists());
    }
}
