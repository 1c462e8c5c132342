//! # maclookup core
//!
//! Shared vocabulary for the MAC manufacturer lookup workspace.
//!
//! - **Types**: [`Manufacturer`] records and normalized [`MacPrefix`] keys
//! - **Errors**: [`LookupError`] covering transport, decode and persistence failures
//! - **Constants**: upstream endpoint, TTL, rate-gate spacing, binding name
//! - **Traits**: seams for the upstream client, rate gate, snapshot store and clock
//!
//! ## Example
//!
//! ```rust
//! use maclookup_core::{MacPrefix, Manufacturer};
//!
//! let prefix = MacPrefix::from_mac("96:be:ef:de:ad:00").unwrap();
//! assert_eq!(prefix.as_str(), "96:be:ef");
//!
//! let m = Manufacturer::new("Acme", "1 A St", "US");
//! let json = serde_json::to_string(&m).unwrap();
//! assert!(json.contains("\"country\":\"US\""));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod clock;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use clock::{ManualClock, SystemClock};
pub use constants::*;
pub use error::{LookupError, Result};
pub use traits::*;
pub use types::*;
