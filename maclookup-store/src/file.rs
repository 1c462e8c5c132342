//! File-based snapshot store.
//!
//! Each binding name maps to one `.json` file. Relative names resolve
//! inside the store directory (the OS temp dir by default); absolute
//! names are used as paths directly.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use maclookup_core::constants::SNAPSHOT_EXTENSION;
use maclookup_core::error::{LookupError, Result};
use maclookup_core::traits::SnapshotStore;

/// File-based snapshot store.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Creates a store rooted at the OS temp directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// Returns the store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolves the file a binding name is stored in.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let name = Path::new(name);
        let path = if name.is_absolute() {
            name.to_path_buf()
        } else {
            self.dir.join(name)
        };
        path.with_extension(SNAPSHOT_EXTENSION)
    }

    fn storage_error(name: &str, err: impl std::fmt::Display) -> LookupError {
        LookupError::Storage {
            name: name.to_string(),
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl SnapshotStore for FileStore {
    #[instrument(skip(self))]
    async fn load(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(name);
        match fs::read(&path).await {
            Ok(bytes) => {
                debug!(path = ?path, len = bytes.len(), "Loaded snapshot");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::storage_error(name, e)),
        }
    }

    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::storage_error(name, e))?;
        }

        // Write atomically (write to temp, then rename)
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Self::storage_error(name, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| Self::storage_error(name, e))?;
        file.sync_all()
            .await
            .map_err(|e| Self::storage_error(name, e))?;
        drop(file);

        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| Self::storage_error(name, e))?;

        debug!(path = ?path, "Saved snapshot");
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.path_for(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::storage_error(name, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_relative_name_resolves_in_dir() {
        let store = FileStore::new("/var/cache/maclookup");
        assert_eq!(
            store.path_for("mac-lookup-cache"),
            PathBuf::from("/var/cache/maclookup/mac-lookup-cache.json")
        );
    }

    #[test]
    fn test_absolute_name_used_as_path() {
        let store = FileStore::new("/var/cache/maclookup");
        assert_eq!(
            store.path_for("/srv/macs.db"),
            PathBuf::from("/srv/macs.json")
        );
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.load("mac-lookup-cache").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save("mac-lookup-cache", b"{\"entries\":[]}").await.unwrap();

        let reopened = FileStore::new(dir.path());
        let bytes = reopened.load("mac-lookup-cache").await.unwrap().unwrap();
        assert_eq!(bytes, b"{\"entries\":[]}");
        assert!(dir.path().join("mac-lookup-cache.json").exists());
    }

    #[tokio::test]
    async fn test_atomic_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save("cache", b"one").await.unwrap();
        store.save("cache", b"two").await.unwrap();

        assert!(!dir.path().join("cache.tmp").exists());
        assert_eq!(store.load("cache").await.unwrap().unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested/deeper"));
        store.save("cache", b"x").await.unwrap();
        assert!(store.path_for("cache").exists());
    }

    #[tokio::test]
    async fn test_save_into_file_path_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = FileStore::new(&blocker);
        let err = store.save("cache", b"x").await.unwrap_err();
        assert!(err.is_persistence());
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save("cache", b"x").await.unwrap();
        store.remove("cache").await.unwrap();
        store.remove("cache").await.unwrap();
        assert!(store.load("cache").await.unwrap().is_none());
    }
}
