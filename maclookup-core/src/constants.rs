//! Constants shared across the maclookup crates.
//!
//! Values mirror the reference configuration of the lookup service:
//! a one-day cache, 22 ms between upstream calls, and the
//! maclookup.app v2 endpoint.

// ═══════════════════════════════════════════════════════════════════════════════
// PREFIX
// ═══════════════════════════════════════════════════════════════════════════════

/// Number of leading characters of a MAC string used as the cache key.
/// `"aa:bb:cc"` is three octets in colon-separated form.
pub const MAC_PREFIX_LEN: usize = 8;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Default time-to-live for cached manufacturers, in seconds (24 hours).
pub const DEFAULT_TTL_SECONDS: u64 = 24 * 60 * 60;

/// Durable location name the lookup cache binds to.
pub const CACHE_BINDING_NAME: &str = "mac-lookup-cache";

/// File extension used by on-disk snapshots.
pub const SNAPSHOT_EXTENSION: &str = "json";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// How often a bound cache is flushed in the background, in seconds.
pub const DEFAULT_FLUSH_INTERVAL_SECONDS: u64 = 5;

// ═══════════════════════════════════════════════════════════════════════════════
// RATE GATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Minimum spacing between upstream requests, in milliseconds.
/// Roughly 45 requests per second.
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 22;

// ═══════════════════════════════════════════════════════════════════════════════
// UPSTREAM
// ═══════════════════════════════════════════════════════════════════════════════

/// Base URL of the maclookup.app API.
pub const DEFAULT_BASE_URL: &str = "https://api.maclookup.app";

/// Path between the base URL and the prefix.
pub const MACS_PATH: &str = "v2/macs";

/// Environment variable holding the upstream API key.
pub const API_KEY_ENV: &str = "MAC_LOOKUP_APP_APIKEY";

/// Default HTTP timeout for upstream requests, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
