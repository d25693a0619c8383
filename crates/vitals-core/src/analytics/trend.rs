//! Direction classification over a short rolling history of derived points.
//!
//! A dead-band (default ±5 %) keeps noise from flapping the classification.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::Serialize;

use crate::names;

/// One sampled set of derived values.
#[derive(Debug, Clone, Default)]
pub struct TrendPoint {
    pub request_rate: f64,
    pub error_rate_percent: f64,
    pub p95_latency_seconds: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Degrading,
    Stable,
    Rising,
    Falling,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendEntry {
    pub metric: String,
    pub current: f64,
    pub previous: f64,
    pub change_percent: f64,
    pub direction: TrendDirection,
}

#[derive(Debug)]
pub struct TrendHistory {
    capacity: usize,
    lookback: usize,
    deadband_percent: f64,
    points: Mutex<VecDeque<TrendPoint>>,
}

impl TrendHistory {
    pub fn new(capacity: usize, lookback: usize, deadband_percent: f64) -> Self {
        Self {
            capacity: capacity.max(lookback + 1),
            lookback: lookback.max(1),
            deadband_percent,
            points: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, point: TrendPoint) {
        let mut points = self.points.lock().unwrap_or_else(|e| e.into_inner());
        points.push_back(point);
        while points.len() > self.capacity {
            points.pop_front();
        }
    }

    /// Compare the newest point against the one `lookback` samples earlier.
    /// Empty until enough history has accumulated.
    pub fn classify(&self) -> Vec<TrendEntry> {
        let points = self.points.lock().unwrap_or_else(|e| e.into_inner());
        let len = points.len();
        if len < self.lookback + 1 {
            return Vec::new();
        }
        let current = &points[len - 1];
        let previous = &points[len - 1 - self.lookback];

        let mut entries = vec![
            self.entry(
                names::KEY_REQUEST_RATE,
                current.request_rate,
                previous.request_rate,
                false,
            ),
            self.entry(
                names::KEY_ERROR_RATE_PERCENT,
                current.error_rate_percent,
                previous.error_rate_percent,
                true,
            ),
        ];
        if let (Some(cur), Some(prev)) =
            (current.p95_latency_seconds, previous.p95_latency_seconds)
        {
            entries.push(self.entry(names::KEY_P95_LATENCY_SECONDS, cur, prev, true));
        }
        entries
    }

    fn entry(
        &self,
        metric: &str,
        current: f64,
        previous: f64,
        higher_is_worse: bool,
    ) -> TrendEntry {
        let change_percent = if previous != 0.0 {
            (current - previous) / previous * 100.0
        } else if current == 0.0 {
            0.0
        } else {
            100.0
        };

        let direction = if change_percent.abs() <= self.deadband_percent {
            TrendDirection::Stable
        } else if higher_is_worse {
            if change_percent > 0.0 {
                TrendDirection::Degrading
            } else {
                TrendDirection::Improving
            }
        } else if change_percent > 0.0 {
            TrendDirection::Rising
        } else {
            TrendDirection::Falling
        };

        TrendEntry {
            metric: metric.to_string(),
            current,
            previous,
            change_percent,
            direction,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn point(rate: f64, errors: f64, p95: f64) -> TrendPoint {
        TrendPoint {
            request_rate: rate,
            error_rate_percent: errors,
            p95_latency_seconds: Some(p95),
        }
    }

    #[test]
    fn no_classification_without_enough_history() {
        let history = TrendHistory::new(16, 3, 5.0);
        history.push(point(10.0, 1.0, 0.2));
        assert!(history.classify().is_empty());
    }

    #[test]
    fn deadband_suppresses_small_moves() {
        let history = TrendHistory::new(16, 1, 5.0);
        history.push(point(100.0, 2.0, 0.50));
        history.push(point(103.0, 2.05, 0.51)); // all within 5%
        for entry in history.classify() {
            assert_eq!(entry.direction, TrendDirection::Stable, "{}", entry.metric);
        }
    }

    #[test]
    fn worsening_error_rate_degrades() {
        let history = TrendHistory::new(16, 1, 5.0);
        history.push(point(100.0, 2.0, 0.5));
        history.push(point(100.0, 4.0, 0.3));

        let entries = history.classify();
        let errors = entries
            .iter()
            .find(|e| e.metric == names::KEY_ERROR_RATE_PERCENT)
            .unwrap();
        assert_eq!(errors.direction, TrendDirection::Degrading);
        let p95 = entries
            .iter()
            .find(|e| e.metric == names::KEY_P95_LATENCY_SECONDS)
            .unwrap();
        assert_eq!(p95.direction, TrendDirection::Improving);
    }

    #[test]
    fn request_rate_is_neutral() {
        let history = TrendHistory::new(16, 1, 5.0);
        history.push(point(100.0, 0.0, 0.1));
        history.push(point(200.0, 0.0, 0.1));

        let entries = history.classify();
        let rate = entries
            .iter()
            .find(|e| e.metric == names::KEY_REQUEST_RATE)
            .unwrap();
        assert_eq!(rate.direction, TrendDirection::Rising);
        assert_eq!(rate.change_percent, 100.0);
    }
}
