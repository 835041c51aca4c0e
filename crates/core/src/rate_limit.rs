//! Fixed-window request counting keyed by caller identity.
//!
//! Windows are aligned to multiples of the window length since the Unix
//! epoch, so every caller's counter resets at the same boundaries.
//!
//! The key store is a bounded LRU: once full, the least recently seen key
//! is evicted and starts again from zero if it returns.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lru::LruCache;

/// Default number of distinct keys tracked at once.
pub const DEFAULT_MAX_KEYS: usize = 10_000;

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// `false` means the request must be rejected.
    pub success: bool,
    /// Maximum requests per window.
    pub limit: u32,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// Unix timestamp (seconds) at which the current window ends.
    pub reset: u64,
}

impl RateLimitDecision {
    /// Seconds until the window resets, relative to `now`.
    pub fn retry_after(&self, now: u64) -> u64 {
        self.reset.saturating_sub(now)
    }
}

/// Anything that can answer "may this caller make another request?".
///
/// Implementations must count atomically: concurrent checks for the same key
/// must never observe the same count.
pub trait RateLimiter: Send + Sync {
    fn check(&self, key: &str) -> RateLimitDecision;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    bucket: u64,
    count: u32,
}

/// In-process fixed-window limiter.
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window_secs: u64,
    windows: Mutex<LruCache<String, Window>>,
}

impl FixedWindowRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_capacity(max_requests, window, DEFAULT_MAX_KEYS)
    }

    pub fn with_capacity(max_requests: u32, window: Duration, max_keys: usize) -> Self {
        let capacity = NonZeroUsize::new(max_keys).unwrap_or(NonZeroUsize::MIN);
        Self {
            max_requests,
            window_secs: window.as_secs().max(1),
            windows: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Check and count a request for `key` at `now` (Unix seconds).
    pub fn check_at(&self, key: &str, now: u64) -> RateLimitDecision {
        let bucket = now / self.window_secs;
        let reset = (bucket + 1) * self.window_secs;

        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        let mut window = match windows.get(key) {
            Some(w) if w.bucket == bucket => *w,
            _ => Window { bucket, count: 0 },
        };

        if window.count >= self.max_requests {
            return RateLimitDecision {
                success: false,
                limit: self.max_requests,
                remaining: 0,
                reset,
            };
        }

        window.count += 1;
        windows.put(key.to_string(), window);
        RateLimitDecision {
            success: true,
            limit: self.max_requests,
            remaining: self.max_requests - window.count,
            reset,
        }
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, unix_now())
    }
}

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
