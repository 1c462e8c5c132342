//! # maclookup lookup
//!
//! Resolves MAC addresses to manufacturers through the maclookup.app API,
//! with a one-day expiring cache, spacing between upstream calls, and a
//! small table of overrides for randomized prefixes the upstream does
//! not know.
//!
//! ## Example
//!
//! ```rust,ignore
//! use maclookup_lookup::ManufacturerLookup;
//!
//! let lookup = ManufacturerLookup::from_env()?;
//! match lookup.lookup_manufacturer("aa:bb:cc:11:22:33", true).await? {
//!     Some(m) => println!("{} ({})", m.company, m.country_code),
//!     None => println!("unknown"),
//! }
//! lookup.force_cache_save().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod client;
mod config;
mod gate;
mod global;
mod lookup;
mod overrides;

pub use client::{EnvKeySource, MacLookupClient, StaticKeySource};
pub use config::{GateKind, LookupConfig};
pub use gate::{BucketGate, SpacingGate};
pub use global::{force_cache_save, global, lookup_manufacturer};
pub use lookup::{ManufacturerLookup, ManufacturerLookupBuilder};
pub use overrides::StaticOverrides;

pub use maclookup_core::{LookupError, MacPrefix, Manufacturer, Result};
