//! Fixed-window request limiting, one counter per verified user.
//!
//! Counters reset entirely at window boundaries, so a user can burst up to
//! twice the ceiling across a window edge. That is accepted fixed-window
//! behavior, not a bug.

use std::time::Duration;

use crate::cache::Cache;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    cache: Cache,
    ceiling: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(cache: Cache, ceiling: u64, window: Duration) -> Self {
        Self {
            cache,
            ceiling,
            window,
        }
    }

    /// Admit or reject one request for the given user.
    ///
    /// Increments the user's counter for the current window (arming the
    /// window TTL on the first hit) and allows the request iff the
    /// post-increment count is within the ceiling. The identity is the
    /// resolved user id, never the raw credential. If the counter store
    /// ever becomes fallible, a failed increment must deny the request.
    pub fn allow(&self, user_id: i64) -> bool {
        let key = format!("ratelimit:{}", user_id);
        let count = self.cache.increment(key, self.window);
        count <= self.ceiling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_is_inclusive() {
        let limiter = RateLimiter::new(Cache::new(), 100, Duration::from_secs(60));

        for _ in 0..100 {
            assert!(limiter.allow(1));
        }
        assert!(!limiter.allow(1));

        // another user is unaffected
        assert!(limiter.allow(2));
    }

    #[test]
    fn test_window_expiry_resets_the_counter() {
        let limiter = RateLimiter::new(Cache::new(), 2, Duration::from_millis(20));

        assert!(limiter.allow(1));
        assert!(limiter.allow(1));
        assert!(!limiter.allow(1));

        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.allow(1));
    }
}
