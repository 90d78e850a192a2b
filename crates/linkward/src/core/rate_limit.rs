use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;

/// Decides how long a request must wait before it may be sent.
pub trait RateLimit: Send + Sync + fmt::Debug {
    /// Registers a request under `key` at `now_ms` and returns the delay in
    /// milliseconds; `0` means the request may go out immediately.
    fn schedule(&self, key: &str, now_ms: u64) -> u64;
}

/// Never delays.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl RateLimit for Unlimited {
    fn schedule(&self, _key: &str, _now_ms: u64) -> u64 {
        0
    }
}

/// At most `limit` requests per fixed window of `interval`, per key.
///
/// A window starts with the first request for a key. Once the limit is
/// exceeded, requests are delayed until the window has elapsed; the first
/// request after that starts a fresh window.
#[derive(Debug)]
pub struct RequestsPerInterval {
    limit: u32,
    interval_ms: u64,
    counters: Mutex<HashMap<String, Counter>>,
}

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: u32,
    window_start_ms: u64,
}

impl RequestsPerInterval {
    pub fn new(limit: u32, interval: Duration) -> Self {
        Self {
            limit,
            interval_ms: interval.as_millis() as u64,
            counters: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimit for RequestsPerInterval {
    fn schedule(&self, key: &str, now_ms: u64) -> u64 {
        let mut counters = self.counters.lock();
        let counter = counters.entry(key.to_string()).or_insert(Counter {
            count: 0,
            window_start_ms: now_ms,
        });

        counter.count = counter.count.saturating_add(1);
        if counter.count <= self.limit {
            return 0;
        }

        let elapsed = now_ms.saturating_sub(counter.window_start_ms);
        if elapsed >= self.interval_ms {
            *counter = Counter {
                count: 1,
                window_start_ms: now_ms,
            };
            return 0;
        }
        self.interval_ms - elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_per_interval() {
        let limit = RequestsPerInterval::new(3, Duration::from_millis(30_000));
        let mut now = 123;
        let key = "https://example.com/.*";

        assert_eq!(limit.schedule(key, now), 0);
        assert_eq!(limit.schedule(key, now), 0);
        assert_eq!(limit.schedule(key, now), 0);
        assert_eq!(limit.schedule(key, now), 30_000);

        now += 30_000;
        assert_eq!(limit.schedule(key, now), 0);
        assert_eq!(limit.schedule(key, now), 0);
        assert_eq!(limit.schedule(key, now), 0);
        assert_eq!(limit.schedule(key, now), 30_000);

        now += 30_000;
        assert_eq!(limit.schedule(key, now), 0);
    }

    #[test]
    fn test_delay_shrinks_within_window() {
        let limit = RequestsPerInterval::new(1, Duration::from_millis(1000));
        assert_eq!(limit.schedule("k", 0), 0);
        assert_eq!(limit.schedule("k", 400), 600);
        assert_eq!(limit.schedule("k", 999), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let limit = RequestsPerInterval::new(1, Duration::from_millis(1000));
        assert_eq!(limit.schedule("a", 0), 0);
        assert_eq!(limit.schedule("b", 0), 0);
        assert_eq!(limit.schedule("a", 0), 1000);
    }

    #[test]
    fn test_unlimited() {
        for _ in 0..100 {
            assert_eq!(Unlimited.schedule("k", 0), 0);
        }
    }
}
