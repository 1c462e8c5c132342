//! Rate gates for upstream requests.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use maclookup_core::error::{LookupError, Result};
use maclookup_core::traits::RateGate;

/// Keeps successive upstream attempts at least `min_interval` apart.
///
/// Each caller reserves the next free slot (`last + min_interval`, or now
/// if that has already passed) under the lock and then sleeps until it.
/// The stored instant is the attempt time, not the completion time, so
/// slow responses do not push later requests back.
#[derive(Debug)]
pub struct SpacingGate {
    min_interval: Duration,
    last_attempt: Mutex<Option<Instant>>,
}

impl SpacingGate {
    /// Creates a gate with the given minimum spacing.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_attempt: Mutex::new(None),
        }
    }

    /// Minimum spacing between attempts.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Instant of the most recently reserved attempt.
    pub fn last_attempt(&self) -> Option<Instant> {
        *self.last_attempt.lock()
    }

    fn reserve(&self) -> Duration {
        let now = Instant::now();
        let mut last = self.last_attempt.lock();
        let slot = match *last {
            Some(prev) => (prev + self.min_interval).max(now),
            None => now,
        };
        *last = Some(slot);
        slot - now
    }
}

#[async_trait]
impl RateGate for SpacingGate {
    async fn until_ready(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            debug!(?wait, "Rate gate delaying request");
            tokio::time::sleep(wait).await;
        }
    }
}

/// Token bucket gate backed by `governor`.
///
/// Refills one token every `period` and holds at most `burst` tokens, so
/// up to `burst` requests may go out back to back after an idle spell.
pub struct BucketGate {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl BucketGate {
    /// Creates a bucket refilling once per `period` with capacity `burst`.
    pub fn new(period: Duration, burst: u32) -> Result<Self> {
        let burst = NonZeroU32::new(burst)
            .ok_or_else(|| LookupError::Config("bucket burst must be at least 1".into()))?;
        let quota = Quota::with_period(period)
            .ok_or_else(|| LookupError::Config("bucket period must be non-zero".into()))?
            .allow_burst(burst);
        Ok(Self {
            limiter: RateLimiter::direct(quota),
        })
    }
}

#[async_trait]
impl RateGate for BucketGate {
    async fn until_ready(&self) {
        self.limiter.until_ready().await;
    }
}
