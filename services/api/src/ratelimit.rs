//! Fixed-window request limiting keyed by caller identity: client IP before
//! authentication, user id after. The windows live in process memory — the
//! service runs as a single process and the limits are advisory
//! backpressure, not billing.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A single fixed-window counter family (one window per key).
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    hits: Mutex<HashMap<String, Window>>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a hit for `key`. `Err(retry_after_seconds)` when the key has
    /// exhausted its window.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), u64> {
        let mut hits = self.hits.lock().expect("rate limiter lock poisoned");

        // Opportunistic cleanup: closed windows are dead weight.
        hits.retain(|_, w| now.duration_since(w.started_at) < self.window);

        let window = hits.entry(key.to_owned()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if window.count >= self.max_requests {
            let retry_after = self
                .window
                .saturating_sub(now.duration_since(window.started_at));
            return Err(retry_after.as_secs().max(1));
        }
        window.count += 1;
        Ok(())
    }
}

/// The limiter families the API applies, one per endpoint class.
#[derive(Debug)]
pub struct RateLimits {
    /// Unauthenticated auth endpoints, keyed by client IP.
    pub auth: RateLimiter,
    /// Note operations, keyed by user id.
    pub notes: RateLimiter,
    /// Search, keyed by user id.
    pub search: RateLimiter,
    /// Bulk deletes, keyed by user id.
    pub bulk: RateLimiter,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            auth: RateLimiter::new(Duration::from_secs(15 * 60), 10),
            notes: RateLimiter::new(Duration::from_secs(10 * 60), 200),
            search: RateLimiter::new(Duration::from_secs(5 * 60), 50),
            bulk: RateLimiter::new(Duration::from_secs(10 * 60), 20),
        }
    }
}
