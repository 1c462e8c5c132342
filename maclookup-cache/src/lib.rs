//! Expiring key-value map for maclookup.
//!
//! One uniform TTL per map, lazy expiry on read, and optional snapshots
//! to a [`SnapshotStore`](maclookup_core::SnapshotStore) binding.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod expiring;
mod snapshot;

pub use expiring::{CacheStats, ExpiringMap, ExpiringMapConfig};
