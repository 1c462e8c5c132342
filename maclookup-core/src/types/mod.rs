//! Domain types for maclookup.
//!
//! - [`Manufacturer`]: company record returned by the upstream or an override
//! - [`MacPrefix`]: the first eight characters of a MAC string, used as cache key
//! - [`UpstreamReply`]: wire shape of a maclookup.app answer

mod manufacturer;
mod prefix;

pub use manufacturer::*;
pub use prefix::*;
