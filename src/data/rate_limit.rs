//! Minimum-spacing limiter for provider calls.
//!
//! One instance per provider, shared by every caller of that provider. The
//! timestamp of the last call is guarded by a FIFO-fair async mutex that stays
//! held across the wait, so concurrent callers are released one interval apart
//! in arrival order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::clock::{Clock, SystemClock};

pub struct RateLimiter {
    name: &'static str,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(name: &'static str, min_interval: Duration) -> Self {
        Self::with_clock(name, min_interval, Arc::new(SystemClock))
    }

    pub fn with_clock(name: &'static str, min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            min_interval,
            last_call: Mutex::new(None),
            clock,
        }
    }

    /// Wait until `min_interval` has passed since the previous `acquire` returned.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let elapsed = self.clock.now().saturating_duration_since(previous);
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(limiter = self.name, wait_ms = wait.as_millis() as u64, "Rate limit wait");
                self.clock.sleep(wait).await;
            }
        }

        *last_call = Some(self.clock.now());
    }
}
