//! Start-to-start request spacing, tracked per origin.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Enforces a minimum gap between the *starts* of requests to one origin.
///
/// Each caller reserves the next free slot under the lock and then sleeps
/// outside it, so concurrent fetches to one origin start `delay` apart while
/// other origins are not held up.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait until a request to `origin` may start. `min_delay` raises the
    /// spacing for this origin (robots.txt `Crawl-delay`).
    pub async fn acquire(&self, origin: &str, min_delay: Option<Duration>) {
        let spacing = min_delay.map_or(self.delay, |d| d.max(self.delay));

        let start_at = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let start_at = slots
                .get(origin)
                .copied()
                .filter(|slot| *slot > now)
                .unwrap_or(now);
            slots.insert(origin.to_string(), start_at + spacing);
            start_at
        };

        sleep_until(start_at).await;
    }
}
