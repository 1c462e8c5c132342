//! # maclookup store
//!
//! Durable locations for cache snapshots.
//!
//! - **Memory**: process-local storage for tests and ephemeral runs
//! - **File**: one JSON file per binding name, written atomically
//!
//! ## Example
//!
//! ```rust,ignore
//! use maclookup_store::FileStore;
//! use maclookup_core::SnapshotStore;
//!
//! let store = FileStore::in_temp_dir();
//! store.save("mac-lookup-cache", b"{}").await?;
//! let bytes = store.load("mac-lookup-cache").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// Re-export the trait from core
pub use maclookup_core::traits::SnapshotStore;
