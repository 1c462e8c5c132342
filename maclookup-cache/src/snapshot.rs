//! On-disk snapshot format.
//!
//! ```text
//! {"version": 1, "entries": [{"key": ..., "value": ..., "inserted_at": RFC3339}]}
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use maclookup_core::constants::SNAPSHOT_VERSION;
use maclookup_core::error::{LookupError, Result};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Snapshot<K, V> {
    pub version: u32,
    pub entries: Vec<SnapshotEntry<K, V>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SnapshotEntry<K, V> {
    pub key: K,
    pub value: V,
    pub inserted_at: DateTime<Utc>,
}

impl<K, V> Snapshot<K, V>
where
    K: Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    pub fn new(entries: Vec<SnapshotEntry<K, V>>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            entries,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self = serde_json::from_slice(bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(LookupError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                actual: snapshot.version,
            });
        }
        Ok(snapshot)
    }
}
