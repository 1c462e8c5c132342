//! In-memory snapshot store.
//!
//! Snapshots live only as long as the store. Cloning shares the
//! underlying map, so a "fresh process" in tests is a new cache bound to
//! a clone of the same store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use maclookup_core::error::Result;
use maclookup_core::traits::SnapshotStore;

#[derive(Debug, Default)]
struct Shared {
    snapshots: RwLock<HashMap<String, Vec<u8>>>,
    saves: AtomicU64,
}

/// In-memory snapshot store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a snapshot exists under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.shared.snapshots.read().contains_key(name)
    }

    /// Returns a copy of the raw snapshot under `name`.
    pub fn snapshot(&self, name: &str) -> Option<Vec<u8>> {
        self.shared.snapshots.read().get(name).cloned()
    }

    /// Number of successful saves since creation.
    pub fn save_count(&self) -> u64 {
        self.shared.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.snapshot(name))
    }

    async fn save(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.shared
            .snapshots
            .write()
            .insert(name.to_string(), bytes.to_vec());
        self.shared.saves.fetch_add(1, Ordering::SeqCst);
        debug!(name, len = bytes.len(), "Saved snapshot in memory");
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.shared.snapshots.write().remove(name);
        Ok(())
    }
}
