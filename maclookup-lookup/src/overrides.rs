//! Built-in manufacturers for prefixes the upstream does not resolve.
//!
//! Some vendors hand out locally-administered, randomized MACs from
//! fixed prefixes. The upstream registry reports those as not found, so
//! the lookup falls back to this table after an upstream miss.

use std::collections::HashMap;

use maclookup_core::Manufacturer;

struct OverrideEntry {
    prefix: &'static str,
    company: &'static str,
    address: &'static str,
    country: &'static str,
}

const APPLE_ADDRESS: &str = "1 Infinite Loop, Cupertino CA 95014, US";

const RANDOMIZED_PREFIXES: &[OverrideEntry] = &[OverrideEntry {
    prefix: "96:be:ef",
    company: "Apple, Inc.",
    address: APPLE_ADDRESS,
    country: "US",
}];

/// Read-only prefix → manufacturer table.
#[derive(Clone, Debug)]
pub struct StaticOverrides {
    entries: HashMap<String, Manufacturer>,
}

impl StaticOverrides {
    /// The table compiled into this crate.
    pub fn builtin() -> Self {
        Self::from_entries(RANDOMIZED_PREFIXES.iter().map(|e| {
            (
                e.prefix.to_string(),
                Manufacturer::new(e.company, e.address, e.country),
            )
        }))
    }

    /// An empty table.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// A table with the given entries, keyed by exact prefix.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Manufacturer)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Looks up an exact prefix.
    pub fn get(&self, prefix: &str) -> Option<&Manufacturer> {
        self.entries.get(prefix)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StaticOverrides {
    fn default() -> Self {
        Self::builtin()
    }
}
