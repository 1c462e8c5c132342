//! Normalized MAC prefix keys.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MAC_PREFIX_LEN;
use crate::error::{LookupError, Result};

/// The leading eight characters of a MAC string, e.g. `"96:be:ef"`.
///
/// No case folding or colon validation happens here: `"AA:BB:CC"` and
/// `"aa:bb:cc"` are different keys, and `"aabbccddeeff"` yields `"aabbccdd"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacPrefix(String);

impl MacPrefix {
    /// Takes the first eight characters of `mac` verbatim.
    ///
    /// Fails when `mac` is shorter than eight bytes or when byte eight
    /// falls inside a multi-byte character.
    pub fn from_mac(mac: &str) -> Result<Self> {
        mac.get(..MAC_PREFIX_LEN)
            .map(|p| Self(p.to_string()))
            .ok_or_else(|| LookupError::InvalidMac(mac.to_string()))
    }

    /// Returns the prefix as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the prefix, returning the owned key.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MacPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MacPrefix {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MacPrefix {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<MacPrefix> for String {
    fn from(prefix: MacPrefix) -> Self {
        prefix.0
    }
}
