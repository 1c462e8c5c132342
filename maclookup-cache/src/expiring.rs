//! In-memory map with a single TTL and optional durable snapshots.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use maclookup_core::constants::{DEFAULT_FLUSH_INTERVAL_SECONDS, DEFAULT_TTL_SECONDS};
use maclookup_core::error::Result;
use maclookup_core::traits::{Clock, SnapshotStore};
use maclookup_core::SystemClock;
use maclookup_store::FileStore;

use crate::snapshot::{Snapshot, SnapshotEntry};

/// Cache entry with its insertion stamp.
#[derive(Clone)]
struct Entry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
}

/// Expiring map configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExpiringMapConfig {
    /// Lifetime of every entry, in seconds
    pub ttl_seconds: u64,
    /// Background flush period once bound, in seconds (0 disables)
    pub flush_interval_seconds: u64,
}

impl Default for ExpiringMapConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
            flush_interval_seconds: DEFAULT_FLUSH_INTERVAL_SECONDS,
        }
    }
}

impl ExpiringMapConfig {
    /// Entry lifetime.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Background flush period, if enabled.
    pub fn flush_interval(&self) -> Option<Duration> {
        (self.flush_interval_seconds > 0).then(|| Duration::from_secs(self.flush_interval_seconds))
    }

    /// Period of the expired-entry sweep: a third of the TTL, at least one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs((self.ttl_seconds / 3).max(1))
    }
}

struct Inner<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    ttl: chrono::Duration,
    config: ExpiringMapConfig,
    clock: Arc<dyn Clock>,
    store: Arc<dyn SnapshotStore>,
    /// Binding name, set once
    binding: Mutex<Option<String>>,
    /// Whether memory differs from the last snapshot
    dirty: AtomicBool,
    /// Serializes flushes and loads against each other
    io_lock: tokio::sync::Mutex<()>,
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn is_fresh(&self, inserted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(inserted_at) < self.ttl
    }

    fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| self.is_fresh(e.inserted_at, now));
        before - entries.len()
    }

    fn snapshot(&self) -> Snapshot<K, V> {
        let now = self.clock.now();
        let entries = self.entries.read();
        Snapshot::new(
            entries
                .iter()
                .filter(|(_, e)| self.is_fresh(e.inserted_at, now))
                .map(|(k, e)| SnapshotEntry {
                    key: k.clone(),
                    value: e.value.clone(),
                    inserted_at: e.inserted_at,
                })
                .collect(),
        )
    }

    async fn flush(&self) -> Result<bool> {
        let Some(name) = self.binding.lock().clone() else {
            return Ok(false);
        };
        let _io = self.io_lock.lock().await;

        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }

        let snapshot = self.snapshot();
        let count = snapshot.entries.len();
        let written = match snapshot.encode() {
            Ok(bytes) => self.store.save(&name, &bytes).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            self.dirty.store(true, Ordering::SeqCst);
            return Err(e);
        }

        debug!(name = %name, count, "Flushed cache snapshot");
        Ok(true)
    }
}

/// Key-value map whose entries expire a fixed time after insertion.
///
/// Thread-safe; clones share the same entries. Expired entries read as
/// absent and are removed when touched, or in bulk by
/// [`cleanup_expired`](Self::cleanup_expired).
///
/// Once bound to a storage name, the map can be written to and restored
/// from a [`SnapshotStore`]. Reads and writes never touch the store.
pub struct ExpiringMap<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for ExpiringMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> ExpiringMap<K, V>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Creates a map with the default configuration, the system clock and
    /// snapshots in the OS temp directory.
    pub fn new() -> Self {
        Self::with_config(ExpiringMapConfig::default())
    }

    /// Creates a map with custom configuration.
    pub fn with_config(config: ExpiringMapConfig) -> Self {
        Self::with_parts(config, Arc::new(SystemClock), Arc::new(FileStore::in_temp_dir()))
    }

    /// Creates a map with an explicit clock and snapshot store.
    pub fn with_parts(
        config: ExpiringMapConfig,
        clock: Arc<dyn Clock>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        let ttl = chrono::Duration::from_std(config.ttl()).unwrap_or(chrono::Duration::MAX);
        let map = Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                ttl,
                config,
                clock,
                store,
                binding: Mutex::new(None),
                dirty: AtomicBool::new(false),
                io_lock: tokio::sync::Mutex::new(()),
            }),
        };
        map.spawn_sweeper();
        map
    }

    /// Returns the value for `key` if present and not expired.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.inner.clock.now();
        {
            let entries = self.inner.entries.read();
            match entries.get(key) {
                None => return None,
                Some(e) if self.inner.is_fresh(e.inserted_at, now) => {
                    return Some(e.value.clone())
                }
                Some(_) => {}
            }
        }

        let mut entries = self.inner.entries.write();
        let expired = entries
            .get(key)
            .is_some_and(|e| !self.inner.is_fresh(e.inserted_at, now));
        if expired {
            entries.remove(key);
        }
        None
    }

    /// Returns true if `key` is present and not expired.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.inner.clock.now();
        self.inner
            .entries
            .read()
            .get(key)
            .is_some_and(|e| self.inner.is_fresh(e.inserted_at, now))
    }

    /// Inserts or replaces `key`, stamping it with the current time.
    pub fn set(&self, key: K, value: V) {
        let entry = Entry {
            value,
            inserted_at: self.inner.clock.now(),
        };
        self.inner.entries.write().insert(key, entry);
        self.inner.dirty.store(true, Ordering::SeqCst);
    }

    /// Removes `key`, returning its value if it was still fresh.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.inner.clock.now();
        let removed = self.inner.entries.write().remove(key)?;
        self.inner.dirty.store(true, Ordering::SeqCst);
        self.inner
            .is_fresh(removed.inserted_at, now)
            .then_some(removed.value)
    }

    /// Clears all entries.
    pub fn clear(&self) {
        let mut entries = self.inner.entries.write();
        if !entries.is_empty() {
            entries.clear();
            self.inner.dirty.store(true, Ordering::SeqCst);
        }
    }

    /// Removes all expired entries, returning how many were dropped.
    ///
    /// A background task does the same every third of the TTL while a
    /// Tokio runtime is available.
    pub fn cleanup_expired(&self) -> usize {
        self.inner.sweep()
    }

    /// Returns the fresh entries.
    pub fn entries(&self) -> Vec<(K, V)> {
        let now = self.inner.clock.now();
        self.inner
            .entries
            .read()
            .iter()
            .filter(|(_, e)| self.inner.is_fresh(e.inserted_at, now))
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect()
    }

    /// Returns the number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = self.inner.clock.now();
        let entries = self.inner.entries.read();
        let expired = entries
            .values()
            .filter(|e| !self.inner.is_fresh(e.inserted_at, now))
            .count();
        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len() - expired,
        }
    }

    /// Entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.inner.config.ttl()
    }

    /// Returns true if memory holds changes not yet flushed.
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::SeqCst)
    }

    /// Returns true once [`bind_storage`](Self::bind_storage) has run.
    pub fn is_bound(&self) -> bool {
        self.inner.binding.lock().is_some()
    }

    /// Returns the binding name, if bound.
    pub fn storage_name(&self) -> Option<String> {
        self.inner.binding.lock().clone()
    }

    /// Associates the map with a durable location and restores what was
    /// last flushed there.
    ///
    /// Only the first call binds; later calls return `Ok(false)` and leave
    /// the binding unchanged. Restored entries keep their original
    /// insertion time, so entries already past the TTL are skipped. When a
    /// Tokio runtime is available a background task flushes the map every
    /// `flush_interval_seconds` until the map is dropped.
    ///
    /// A snapshot that cannot be read or decoded is reported, but the
    /// binding stays in place and later flushes overwrite it.
    #[instrument(skip(self))]
    pub async fn bind_storage(&self, name: &str) -> Result<bool> {
        // Held from binding through restore so no flush lands in between
        let io = self.inner.io_lock.lock().await;
        {
            let mut binding = self.inner.binding.lock();
            if let Some(existing) = binding.as_ref() {
                if existing != name {
                    warn!(existing = %existing, requested = name, "Cache already bound, ignoring");
                }
                return Ok(false);
            }
            *binding = Some(name.to_string());
        }

        let restored = self.restore(name).await;
        drop(io);
        self.spawn_autoflush();
        restored?;
        Ok(true)
    }

    /// Writes the fresh entries to the bound location.
    ///
    /// Returns `Ok(false)` without I/O when unbound or when nothing changed
    /// since the last successful flush. On failure the map stays dirty.
    #[instrument(skip(self))]
    pub async fn flush_to_storage(&self) -> Result<bool> {
        self.inner.flush().await
    }

    /// Merges the snapshot under `name` into memory. Caller holds `io_lock`.
    async fn restore(&self, name: &str) -> Result<usize> {
        let Some(bytes) = self.inner.store.load(name).await? else {
            debug!(name, "No snapshot to restore");
            return Ok(0);
        };
        let snapshot = Snapshot::<K, V>::decode(&bytes)?;
        let now = self.inner.clock.now();

        let (restored, had_entries) = {
            let mut entries = self.inner.entries.write();
            let had_entries = !entries.is_empty();
            let mut restored = 0;
            for e in snapshot.entries {
                if !self.inner.is_fresh(e.inserted_at, now) {
                    continue;
                }
                let newer_in_memory = entries
                    .get(&e.key)
                    .is_some_and(|existing| existing.inserted_at >= e.inserted_at);
                if !newer_in_memory {
                    entries.insert(
                        e.key,
                        Entry {
                            value: e.value,
                            inserted_at: e.inserted_at,
                        },
                    );
                    restored += 1;
                }
            }
            (restored, had_entries)
        };

        // Memory now holds more than the snapshot does
        if had_entries {
            self.inner.dirty.store(true, Ordering::SeqCst);
        }
        info!(name, restored, "Restored cache snapshot");
        Ok(restored)
    }

    fn spawn_sweeper(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let period = self.inner.config.sweep_interval();
        let weak = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let removed = inner.sweep();
                if removed > 0 {
                    debug!(removed, "Swept expired cache entries");
                }
            }
        });
    }

    fn spawn_autoflush(&self) {
        let Some(period) = self.inner.config.flush_interval() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No Tokio runtime, background flush disabled");
            return;
        };

        let weak = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if let Err(e) = inner.flush().await {
                    warn!(error = %e, "Background cache flush failed");
                }
            }
        });
    }
}

impl<K, V> Default for ExpiringMap<K, V>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired entries not yet removed
    pub expired_entries: usize,
    /// Valid (non-expired) entries
    pub valid_entries: usize,
}
