//! Global request pacing
//!
//! One [`RateLimiter`] is shared by every fetch task of a crawl. Each caller
//! reserves the next free slot, so request starts are at least `interval`
//! apart no matter how many tasks are in flight.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Fixed-interval gate shared across fetch tasks
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing one request start per `interval`
    ///
    /// A zero interval disables pacing.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until this caller may start a request
    ///
    /// The first call returns immediately. The reservation is taken under the
    /// lock but the sleep happens outside it, so waiters queue on slots
    /// rather than on the mutex.
    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }

        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next = Some(slot + self.interval);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }
}
