//! Lookup orchestrator.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use maclookup_cache::ExpiringMap;
use maclookup_core::error::Result;
use maclookup_core::traits::{ApiKeySource, Clock, RateGate, SnapshotStore, UpstreamClient};
use maclookup_core::{MacPrefix, Manufacturer, SystemClock};
use maclookup_store::FileStore;

use crate::client::{EnvKeySource, MacLookupClient};
use crate::config::{GateKind, LookupConfig};
use crate::gate::{BucketGate, SpacingGate};
use crate::overrides::StaticOverrides;

/// Resolves MAC addresses to manufacturers.
///
/// Answers come from the expiring cache when possible. A miss waits on
/// the rate gate, asks the upstream, and falls back to the static
/// overrides when the upstream does not know the prefix. Positive answers
/// are cached; unknown prefixes are not, so they are asked for again on
/// the next call.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct ManufacturerLookup {
    cache: ExpiringMap<MacPrefix, Manufacturer>,
    gate: Arc<dyn RateGate>,
    upstream: Arc<dyn UpstreamClient>,
    key_source: Arc<dyn ApiKeySource>,
    overrides: StaticOverrides,
    api_key: RwLock<String>,
    storage_name: String,
    bound: OnceCell<()>,
}

impl ManufacturerLookup {
    /// Creates a lookup with the default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Creates a lookup configured from `MAC_LOOKUP_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::builder().config(LookupConfig::from_env()?).build()
    }

    /// Starts a builder.
    pub fn builder() -> ManufacturerLookupBuilder {
        ManufacturerLookupBuilder::default()
    }

    /// Looks up the manufacturer for `raw_mac`.
    ///
    /// Only the first eight characters of `raw_mac` are used. With
    /// `persist`, the first call binds the cache to its durable location
    /// and restores earlier snapshots; later calls leave the binding alone.
    ///
    /// Returns `Ok(None)` when neither the upstream nor the overrides know
    /// the prefix. Errors are transport or decode failures from the
    /// upstream, or [`InvalidMac`](maclookup_core::LookupError::InvalidMac)
    /// for inputs shorter than a prefix. The cache is left untouched on
    /// every error.
    #[instrument(skip(self))]
    pub async fn lookup_manufacturer(
        &self,
        raw_mac: &str,
        persist: bool,
    ) -> Result<Option<Manufacturer>> {
        let prefix = MacPrefix::from_mac(raw_mac)?;

        if persist {
            self.ensure_bound().await;
        }

        if let Some(hit) = self.cache.get(&prefix) {
            debug!(prefix = %prefix, "Cache hit");
            return Ok(Some(hit));
        }

        self.gate.until_ready().await;

        let api_key = self.api_key();
        let reply = self.upstream.fetch(prefix.as_str(), &api_key).await?;

        if let Some(manufacturer) = reply.into_manufacturer() {
            self.cache.set(prefix, manufacturer.clone());
            return Ok(Some(manufacturer));
        }

        match self.overrides.get(prefix.as_str()) {
            Some(fallback) => {
                debug!(prefix = %prefix, "Upstream miss, using override");
                let fallback = fallback.clone();
                self.cache.set(prefix, fallback.clone());
                Ok(Some(fallback))
            }
            None => {
                debug!(prefix = %prefix, "Unknown prefix");
                Ok(None)
            }
        }
    }

    /// Writes the cache to its durable location now.
    ///
    /// Does nothing when persistence was never requested or when nothing
    /// changed since the last write.
    #[instrument(skip(self))]
    pub async fn force_cache_save(&self) -> Result<()> {
        self.cache.flush_to_storage().await?;
        Ok(())
    }

    /// Binds the cache to its durable location without looking anything up.
    pub async fn bind_storage(&self) {
        self.ensure_bound().await;
    }

    /// The underlying cache.
    pub fn cache(&self) -> &ExpiringMap<MacPrefix, Manufacturer> {
        &self.cache
    }

    /// The override table consulted on upstream misses.
    pub fn overrides(&self) -> &StaticOverrides {
        &self.overrides
    }

    /// Name of the durable location used when persisting.
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    async fn ensure_bound(&self) {
        self.bound
            .get_or_init(|| async {
                match self.cache.bind_storage(&self.storage_name).await {
                    Ok(_) => info!(name = %self.storage_name, "Cache persistence enabled"),
                    Err(e) => {
                        warn!(name = %self.storage_name, error = %e, "Could not restore cache snapshot")
                    }
                }
            })
            .await;
    }

    /// Returns the API key, reading it from the key source until one is found.
    fn api_key(&self) -> String {
        {
            let key = self.api_key.read();
            if !key.is_empty() {
                return key.clone();
            }
        }

        let Some(found) = self.key_source.read() else {
            return String::new();
        };
        let mut key = self.api_key.write();
        if key.is_empty() {
            *key = found;
        }
        key.clone()
    }
}

/// Builder for [`ManufacturerLookup`].
///
/// Anything not set falls back to the production collaborator implied by
/// the configuration.
#[derive(Default)]
pub struct ManufacturerLookupBuilder {
    config: LookupConfig,
    clock: Option<Arc<dyn Clock>>,
    store: Option<Arc<dyn SnapshotStore>>,
    gate: Option<Arc<dyn RateGate>>,
    upstream: Option<Arc<dyn UpstreamClient>>,
    key_source: Option<Arc<dyn ApiKeySource>>,
    overrides: Option<StaticOverrides>,
}

impl ManufacturerLookupBuilder {
    /// Replaces the configuration.
    pub fn config(mut self, config: LookupConfig) -> Self {
        self.config = config;
        self
    }

    /// Clock used for cache expiry.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Where snapshots are kept.
    pub fn store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Rate gate in front of the upstream.
    pub fn gate(mut self, gate: Arc<dyn RateGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Upstream client.
    pub fn upstream(mut self, upstream: Arc<dyn UpstreamClient>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// API key source.
    pub fn key_source(mut self, key_source: Arc<dyn ApiKeySource>) -> Self {
        self.key_source = Some(key_source);
        self
    }

    /// Override table.
    pub fn overrides(mut self, overrides: StaticOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Builds the lookup.
    pub fn build(self) -> Result<ManufacturerLookup> {
        let config = self.config;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(FileStore::new(config.storage_dir())));
        let gate = match self.gate {
            Some(gate) => gate,
            None => default_gate(&config)?,
        };
        let upstream: Arc<dyn UpstreamClient> = match self.upstream {
            Some(upstream) => upstream,
            None => Arc::new(MacLookupClient::with_base_url(
                &config.base_url,
                config.timeout(),
            )?),
        };
        let key_source = self
            .key_source
            .unwrap_or_else(|| Arc::new(EnvKeySource::default()));

        Ok(ManufacturerLookup {
            cache: ExpiringMap::with_parts(config.cache_config(), clock, store),
            gate,
            upstream,
            key_source,
            overrides: self.overrides.unwrap_or_default(),
            api_key: RwLock::new(String::new()),
            storage_name: config.storage_name,
            bound: OnceCell::new(),
        })
    }
}

fn default_gate(config: &LookupConfig) -> Result<Arc<dyn RateGate>> {
    Ok(match config.gate {
        GateKind::Spacing => Arc::new(SpacingGate::new(config.min_interval())),
        GateKind::Bucket => Arc::new(BucketGate::new(config.min_interval(), config.bucket_burst)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use maclookup_core::error::LookupError;
    use maclookup_core::{ManualClock, UpstreamReply};
    use maclookup_store::MemoryStore;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingUpstream {
        keys: Mutex<Vec<String>>,
        found: bool,
    }

    #[async_trait]
    impl UpstreamClient for RecordingUpstream {
        async fn fetch(&self, prefix: &str, api_key: &str) -> Result<UpstreamReply> {
            self.keys.lock().push(api_key.to_string());
            if self.found {
                Ok(UpstreamReply::hit(&Manufacturer::new(prefix, "addr", "US")))
            } else {
                Ok(UpstreamReply::miss())
            }
        }
    }

    struct CountingKeySource {
        reads: AtomicUsize,
        key: Mutex<Option<String>>,
    }

    impl ApiKeySource for CountingKeySource {
        fn read(&self) -> Option<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.key.lock().clone()
        }
    }

    struct OpenGate;

    #[async_trait]
    impl RateGate for OpenGate {
        async fn until_ready(&self) {}
    }

    fn build(
        upstream: Arc<RecordingUpstream>,
        keys: Arc<CountingKeySource>,
        store: &MemoryStore,
    ) -> ManufacturerLookup {
        ManufacturerLookup::builder()
            .clock(Arc::new(ManualClock::new()))
            .store(Arc::new(store.clone()))
            .gate(Arc::new(OpenGate))
            .upstream(upstream)
            .key_source(keys)
            .build()
            .unwrap()
    }

    fn key_source(key: Option<&str>) -> Arc<CountingKeySource> {
        Arc::new(CountingKeySource {
            reads: AtomicUsize::new(0),
            key: Mutex::new(key.map(String::from)),
        })
    }

    #[tokio::test]
    async fn test_api_key_read_once_when_present() {
        let upstream = Arc::new(RecordingUpstream {
            found: false,
            ..Default::default()
        });
        let keys = key_source(Some("secret"));
        let lookup = build(upstream.clone(), keys.clone(), &MemoryStore::new());

        lookup.lookup_manufacturer("00:00:00:00:00:01", false).await.unwrap();
        *keys.key.lock() = Some("rotated".into());
        lookup.lookup_manufacturer("00:00:00:00:00:02", false).await.unwrap();

        assert_eq!(keys.reads.load(Ordering::SeqCst), 1);
        assert_eq!(*upstream.keys.lock(), vec!["secret", "secret"]);
    }

    #[tokio::test]
    async fn test_api_key_retried_while_missing() {
        let upstream = Arc::new(RecordingUpstream {
            found: false,
            ..Default::default()
        });
        let keys = key_source(None);
        let lookup = build(upstream.clone(), keys.clone(), &MemoryStore::new());

        lookup.lookup_manufacturer("00:00:00:00:00:01", false).await.unwrap();
        *keys.key.lock() = Some("late".into());
        lookup.lookup_manufacturer("00:00:00:00:00:02", false).await.unwrap();

        assert_eq!(keys.reads.load(Ordering::SeqCst), 2);
        assert_eq!(*upstream.keys.lock(), vec!["", "late"]);
    }

    #[tokio::test]
    async fn test_short_mac_rejected_before_upstream() {
        let upstream = Arc::new(RecordingUpstream::default());
        let lookup = build(upstream.clone(), key_source(None), &MemoryStore::new());

        let err = lookup.lookup_manufacturer("aa:bb", false).await.unwrap_err();
        assert!(matches!(err, LookupError::InvalidMac(_)));
        assert!(upstream.keys.lock().is_empty());
    }

    #[tokio::test]
    async fn test_persist_binds_once() {
        let store = MemoryStore::new();
        let upstream = Arc::new(RecordingUpstream {
            found: true,
            ..Default::default()
        });
        let lookup = build(upstream, key_source(None), &store);

        assert!(!lookup.cache().is_bound());
        lookup.lookup_manufacturer("aa:bb:cc:00:00:00", true).await.unwrap();
        lookup.lookup_manufacturer("dd:ee:ff:00:00:00", true).await.unwrap();
        assert_eq!(lookup.cache().storage_name().as_deref(), Some("mac-lookup-cache"));

        lookup.force_cache_save().await.unwrap();
        assert!(store.contains("mac-lookup-cache"));
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_without_persist_nothing_is_written() {
        let store = MemoryStore::new();
        let upstream = Arc::new(RecordingUpstream {
            found: true,
            ..Default::default()
        });
        let lookup = build(upstream, key_source(None), &store);

        lookup.lookup_manufacturer("aa:bb:cc:00:00:00", false).await.unwrap();
        lookup.force_cache_save().await.unwrap();
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_does_not_fail_lookup() {
        let store = MemoryStore::new();
        store.save("mac-lookup-cache", b"{not json").await.unwrap();
        let upstream = Arc::new(RecordingUpstream {
            found: true,
            ..Default::default()
        });
        let lookup = build(upstream, key_source(None), &store);

        let m = lookup.lookup_manufacturer("aa:bb:cc:00:00:00", true).await.unwrap();
        assert_eq!(m.map(|m| m.company), Some("aa:bb:cc".to_string()));
        assert!(lookup.cache().is_bound());
    }

    #[test]
    fn test_bucket_config_validated() {
        let config = LookupConfig {
            gate: GateKind::Bucket,
            bucket_burst: 0,
            ..Default::default()
        };
        let result = ManufacturerLookup::builder()
            .config(config)
            .upstream(Arc::new(RecordingUpstream::default()))
            .build();
        assert!(matches!(result, Err(LookupError::Config(_))));
    }
}
