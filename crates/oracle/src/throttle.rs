//! Call throttling for the scoring service.
//!
//! One in-flight call at a time and a fixed minimum interval between
//! successive call starts. The throttle is an explicitly constructed
//! object shared by `Arc` among every oracle caller in the process;
//! there is no ambient global. `tokio::sync::Mutex` hands the lock out
//! in FIFO order, which gives queued callers their slots in arrival
//! order.

use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::{sleep, Instant};

/// Default spacing between successive oracle calls.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

/// Holding the slot keeps the throttle locked, so at most one call is
/// in flight until it drops.
pub struct ThrottleSlot<'a> {
    _guard: MutexGuard<'a, Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            min_interval,
            last_start: Mutex::new(None),
        })
    }

    pub fn with_default_interval() -> std::sync::Arc<Self> {
        Self::new(DEFAULT_MIN_INTERVAL)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for the concurrency slot and the elapsed-interval condition,
    /// then claim the slot.
    pub async fn admit(&self) -> ThrottleSlot<'_> {
        let mut last_start = self.last_start.lock().await;
        if let Some(previous) = *last_start {
            let since = previous.elapsed();
            if since < self.min_interval {
                sleep(self.min_interval - since).await;
            }
        }
        *last_start = Some(Instant::now());
        ThrottleSlot { _guard: last_start }
    }
}
