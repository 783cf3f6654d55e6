use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::{callbacks::SecurePersistentStore, error::StoreError};

/// A [SecurePersistentStore] keeping one file per key inside `dir`.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so readers see either the old or the new content.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl SecurePersistentStore for FileStore {
    fn remove_entry(&self, key: String) -> Result<(), StoreError> {
        match fs::remove_file(self.path(&key)) {
            Ok(()) => {
                debug!("Removed {key} from {}", self.dir.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn get(&self, key: String) -> Option<Vec<u8>> {
        match fs::read(self.path(&key)) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read {key} from {}: {e}", self.dir.display());
                None
            }
        }
    }

    fn set(&self, key: String, value: Vec<u8>) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&value)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path(&key))?;

        debug!("Wrote {} bytes to {key}", value.len());
        Ok(())
    }
}
