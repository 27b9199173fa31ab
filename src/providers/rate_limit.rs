//! Sliding-window rate limiting for provider calls.
//!
//! Keeps the timestamps of granted calls from the trailing 24 hours. A call
//! is allowed only while both the last-hour and last-day counts are below
//! their thresholds. Denied calls are not recorded, so a denial never pushes
//! the next free slot further out.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::clock::Clock;

/// Default calls allowed per rolling hour.
pub const DEFAULT_MAX_PER_HOUR: u32 = 20;
/// Default calls allowed per rolling day.
pub const DEFAULT_MAX_PER_DAY: u32 = 100;

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Point-in-time view of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitUsage {
    pub last_hour: u32,
    pub last_day: u32,
    pub max_per_hour: u32,
    pub max_per_day: u32,
}

impl RateLimitUsage {
    /// Calls still available before the tighter of the two limits is hit.
    pub fn remaining(&self) -> u32 {
        let hourly = self.max_per_hour.saturating_sub(self.last_hour);
        let daily = self.max_per_day.saturating_sub(self.last_day);
        hourly.min(daily)
    }
}

/// Hourly + daily sliding-window limiter.
pub struct RateLimiter {
    window: Mutex<VecDeque<i64>>,
    clock: Arc<dyn Clock>,
    max_per_hour: u32,
    max_per_day: u32,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_per_hour", &self.max_per_hour)
            .field("max_per_day", &self.max_per_day)
            .finish()
    }
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>, max_per_hour: u32, max_per_day: u32) -> Self {
        Self {
            window: Mutex::new(VecDeque::new()),
            clock,
            max_per_hour,
            max_per_day,
        }
    }

    pub fn with_defaults(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, DEFAULT_MAX_PER_HOUR, DEFAULT_MAX_PER_DAY)
    }

    /// Try to take a slot. Prune, count and append happen under one lock.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now_millis();
        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());

        prune(&mut window, now);
        let (last_hour, last_day) = counts(&window, now);

        if last_hour >= self.max_per_hour || last_day >= self.max_per_day {
            debug!(last_hour, last_day, "Rate limit reached, denying call");
            return false;
        }

        window.push_back(now);
        true
    }

    pub fn usage(&self) -> RateLimitUsage {
        let now = self.clock.now_millis();
        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        prune(&mut window, now);
        let (last_hour, last_day) = counts(&window, now);
        RateLimitUsage {
            last_hour,
            last_day,
            max_per_hour: self.max_per_hour,
            max_per_day: self.max_per_day,
        }
    }

    /// Forget every recorded call.
    pub fn reset(&self) {
        self.window
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

/// Drop timestamps older than 24 hours. The deque is in insertion order,
/// which is also time order for a monotonic clock.
fn prune(window: &mut VecDeque<i64>, now: i64) {
    while let Some(&oldest) = window.front() {
        if now - oldest >= DAY_MS {
            window.pop_front();
        } else {
            break;
        }
    }
}

fn counts(window: &VecDeque<i64>, now: i64) -> (u32, u32) {
    let last_day = window.len() as u32;
    let last_hour = window.iter().filter(|&&t| now - t < HOUR_MS).count() as u32;
    (last_hour, last_day)
}
