//! Common traits for maclookup.
//!
//! These are the seams between the lookup orchestrator and its
//! collaborators, so tests can swap in fakes for the network, the disk
//! and the clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::UpstreamReply;

// ═══════════════════════════════════════════════════════════════════════════════
// CLOCK
// ═══════════════════════════════════════════════════════════════════════════════

/// Source of wall-clock time for TTL decisions.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SNAPSHOT STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Durable key-value location for cache snapshots.
///
/// A snapshot is an opaque byte blob addressed by a binding name.
/// Implementations might use:
/// - a directory of files (one per name)
/// - process memory (for tests)
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Reads the snapshot saved under `name`, or `None` if nothing was saved.
    async fn load(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Replaces the snapshot under `name`.
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Deletes the snapshot under `name`. Missing snapshots are not an error.
    async fn remove(&self, name: &str) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// RATE GATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Spaces out upstream requests.
///
/// Called once per cache miss, before the request is issued.
#[async_trait]
pub trait RateGate: Send + Sync {
    /// Waits until the caller may issue the next request.
    async fn until_ready(&self);
}

// ═══════════════════════════════════════════════════════════════════════════════
// UPSTREAM
// ═══════════════════════════════════════════════════════════════════════════════

/// Remote service that resolves MAC prefixes.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Fetches the record for `prefix`.
    ///
    /// A prefix the service does not know is `Ok` with `found == false`;
    /// only transport and decode failures are errors.
    async fn fetch(&self, prefix: &str, api_key: &str) -> Result<UpstreamReply>;
}

/// Where the upstream API key comes from.
pub trait ApiKeySource: Send + Sync {
    /// Reads the key, or `None` if it is not configured.
    fn read(&self) -> Option<String>;
}
