//! Lookup configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use maclookup_cache::ExpiringMapConfig;
use maclookup_core::constants::{
    CACHE_BINDING_NAME, DEFAULT_BASE_URL, DEFAULT_FLUSH_INTERVAL_SECONDS, DEFAULT_MIN_INTERVAL_MS,
    DEFAULT_TIMEOUT_SECONDS, DEFAULT_TTL_SECONDS,
};
use maclookup_core::error::{LookupError, Result};

/// Which rate gate guards the upstream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateKind {
    /// Minimum spacing between attempts
    #[default]
    Spacing,
    /// Token bucket with burst
    Bucket,
}

impl FromStr for GateKind {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spacing" => Ok(GateKind::Spacing),
            "bucket" => Ok(GateKind::Bucket),
            other => Err(LookupError::Config(format!("unknown gate kind '{}'", other))),
        }
    }
}

/// Lookup configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Upstream base URL
    pub base_url: String,
    /// Cache entry lifetime in seconds
    pub ttl_seconds: u64,
    /// Minimum spacing between upstream requests in milliseconds
    pub min_interval_ms: u64,
    /// HTTP timeout in seconds
    pub timeout_seconds: u64,
    /// Binding name for the persisted cache
    pub storage_name: String,
    /// Directory relative binding names resolve in (OS temp dir when unset)
    pub storage_dir: Option<PathBuf>,
    /// Background flush period once bound, in seconds (0 disables)
    pub flush_interval_seconds: u64,
    /// Rate gate implementation
    pub gate: GateKind,
    /// Bucket capacity when `gate` is `Bucket`
    pub bucket_burst: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            storage_name: CACHE_BINDING_NAME.into(),
            storage_dir: None,
            flush_interval_seconds: DEFAULT_FLUSH_INTERVAL_SECONDS,
            gate: GateKind::Spacing,
            bucket_burst: 1,
        }
    }
}

impl LookupConfig {
    /// Loads `.env` if present, then applies `MAC_LOOKUP_*` overrides to the defaults.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Applies overrides read through `get` to the defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = get("MAC_LOOKUP_BASE_URL") {
            config.base_url = v;
        }
        if let Some(v) = parse_var(&get, "MAC_LOOKUP_TTL_SECONDS")? {
            config.ttl_seconds = v;
        }
        if let Some(v) = parse_var(&get, "MAC_LOOKUP_MIN_INTERVAL_MS")? {
            config.min_interval_ms = v;
        }
        if let Some(v) = parse_var(&get, "MAC_LOOKUP_TIMEOUT_SECONDS")? {
            config.timeout_seconds = v;
        }
        if let Some(v) = get("MAC_LOOKUP_CACHE_DIR") {
            config.storage_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = parse_var(&get, "MAC_LOOKUP_FLUSH_INTERVAL_SECONDS")? {
            config.flush_interval_seconds = v;
        }
        if let Some(v) = parse_var(&get, "MAC_LOOKUP_GATE")? {
            config.gate = v;
        }
        if let Some(v) = parse_var(&get, "MAC_LOOKUP_BUCKET_BURST")? {
            config.bucket_burst = v;
        }

        Ok(config)
    }

    /// Minimum spacing between upstream requests.
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// HTTP timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Directory snapshots are written to.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Settings for the underlying expiring map.
    pub fn cache_config(&self) -> ExpiringMapConfig {
        ExpiringMapConfig {
            ttl_seconds: self.ttl_seconds,
            flush_interval_seconds: self.flush_interval_seconds,
        }
    }
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| LookupError::Config(format!("{}='{}': {}", name, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<LookupConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LookupConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_reference_defaults() {
        let config = LookupConfig::default();
        assert_eq!(config.base_url, "https://api.maclookup.app");
        assert_eq!(config.ttl_seconds, 86_400);
        assert_eq!(config.min_interval(), Duration::from_millis(22));
        assert_eq!(config.storage_name, "mac-lookup-cache");
        assert_eq!(config.storage_dir(), std::env::temp_dir());
        assert_eq!(config.gate, GateKind::Spacing);
    }

    #[test]
    fn test_overrides_applied() {
        let config = from_pairs(&[
            ("MAC_LOOKUP_BASE_URL", "http://localhost:9000"),
            ("MAC_LOOKUP_TTL_SECONDS", "60"),
            ("MAC_LOOKUP_MIN_INTERVAL_MS", " 100 "),
            ("MAC_LOOKUP_CACHE_DIR", "/var/cache/maclookup"),
            ("MAC_LOOKUP_GATE", "Bucket"),
            ("MAC_LOOKUP_BUCKET_BURST", "5"),
        ])
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.cache_config().ttl_seconds, 60);
        assert_eq!(config.min_interval(), Duration::from_millis(100));
        assert_eq!(config.storage_dir(), PathBuf::from("/var/cache/maclookup"));
        assert_eq!(config.gate, GateKind::Bucket);
        assert_eq!(config.bucket_burst, 5);
    }

    #[test_case("MAC_LOOKUP_TTL_SECONDS", "a day" ; "ttl")]
    #[test_case("MAC_LOOKUP_MIN_INTERVAL_MS", "-3" ; "negative interval")]
    #[test_case("MAC_LOOKUP_GATE", "leaky" ; "gate kind")]
    fn test_invalid_override_rejected(name: &str, value: &str) {
        let err = from_pairs(&[(name, value)]).unwrap_err();
        assert!(matches!(err, LookupError::Config(ref msg) if msg.contains(name)));
    }

    #[test]
    fn test_gate_kind_serde() {
        assert_eq!(serde_json::to_string(&GateKind::Bucket).unwrap(), "\"bucket\"");
    }
}
