//! Sliding-window counter derivatives.
//!
//! Each tracked counter keeps a rolling buffer of `(timestamp, value)` pairs
//! bounded to the configured window. The derivative mirrors a time-windowed
//! `rate()` over two in-process samples, not a true range query.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RateTracker {
    window: Duration,
    series: Mutex<HashMap<String, VecDeque<(Instant, f64)>>>,
}

impl RateTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            series: Mutex::new(HashMap::new()),
        }
    }

    pub fn record(&self, key: &str, value: f64) {
        self.record_at(key, Instant::now(), value);
    }

    /// Record a sample at an explicit timestamp (replay/test hook).
    pub fn record_at(&self, key: &str, at: Instant, value: f64) {
        let mut series = self.series.lock().unwrap_or_else(|e| e.into_inner());
        let buf = series.entry(key.to_string()).or_default();
        buf.push_back((at, value));
        while let Some(&(oldest, _)) = buf.front() {
            if at.duration_since(oldest) > self.window {
                buf.pop_front();
            } else {
                break;
            }
        }
    }

    /// Per-second derivative over the full window. 0 with fewer than two
    /// samples; deltas are clamped at 0 (counters never decrease in-process).
    pub fn rate(&self, key: &str) -> f64 {
        self.rate_within(key, self.window)
    }

    /// Per-second derivative restricted to the most recent `window`.
    pub fn rate_within(&self, key: &str, window: Duration) -> f64 {
        let series = self.series.lock().unwrap_or_else(|e| e.into_inner());
        let Some(buf) = series.get(key) else {
            return 0.0;
        };
        let Some(&(newest_at, newest_v)) = buf.back() else {
            return 0.0;
        };
        let oldest = buf
            .iter()
            .find(|(at, _)| newest_at.duration_since(*at) <= window);
        let Some(&(oldest_at, oldest_v)) = oldest else {
            return 0.0;
        };
        let elapsed = newest_at.duration_since(oldest_at).as_secs_f64();
        if elapsed <= 0.0 {
            return 0.0;
        }
        ((newest_v - oldest_v) / elapsed).max(0.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn rate_from_two_samples() {
        let tracker = RateTracker::new(Duration::from_secs(300));
        let t0 = Instant::now();
        tracker.record_at("requests", t0, 100.0);
        tracker.record_at("requests", t0 + Duration::from_secs(5), 150.0);
        assert_eq!(tracker.rate("requests"), 10.0);
    }

    #[test]
    fn fewer_than_two_samples_is_zero() {
        let tracker = RateTracker::new(Duration::from_secs(300));
        assert_eq!(tracker.rate("requests"), 0.0);
        tracker.record("requests", 100.0);
        assert_eq!(tracker.rate("requests"), 0.0);
    }

    #[test]
    fn samples_outside_the_window_are_dropped() {
        let tracker = RateTracker::new(Duration::from_secs(60));
        let t0 = Instant::now();
        tracker.record_at("requests", t0, 0.0);
        tracker.record_at("requests", t0 + Duration::from_secs(120), 600.0);
        // The first sample aged out, so only one remains.
        assert_eq!(tracker.rate("requests"), 0.0);
    }

    #[test]
    fn rate_within_narrows_the_span() {
        let tracker = RateTracker::new(Duration::from_secs(300));
        let t0 = Instant::now();
        tracker.record_at("requests", t0, 0.0);
        tracker.record_at("requests", t0 + Duration::from_secs(100), 1000.0);
        tracker.record_at("requests", t0 + Duration::from_secs(110), 1100.0);
        // Over the last 10s: (1100 - 1000) / 10.
        assert_eq!(
            tracker.rate_within("requests", Duration::from_secs(10)),
            10.0
        );
    }
}
