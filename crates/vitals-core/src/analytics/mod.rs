//! Derived analytics over registry snapshots.
//!
//! The analyzer is strictly a reader: it never mutates registry state. Its
//! only private state is the rate windows and the trend history, both fed by
//! `observe()` on sampler ticks.

mod health;
mod percentile;
mod rate;
mod trend;

pub use health::{
    default_alert_rules, evaluate_alerts, ActiveAlert, AlertThreshold, Comparator,
    ComponentPenalty, HealthInputs, HealthPolicy, HealthReport, HealthStatus, HealthThresholds,
    HealthWeights, Severity,
};
pub use percentile::percentile;
pub use rate::RateTracker;
pub use trend::{TrendDirection, TrendEntry, TrendHistory, TrendPoint};

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::metric::RegistrySnapshot;
use crate::names;

/// Analytics tuning; every constant the engine derives signals from lives
/// here so operators can adjust without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    pub rate_window_seconds: u64,
    pub trend_deadband_percent: f64,
    pub trend_lookback: usize,
    pub thresholds: HealthThresholds,
    pub weights: HealthWeights,
    pub alerts: Vec<AlertThreshold>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            rate_window_seconds: 300,
            trend_deadband_percent: 5.0,
            trend_lookback: 5,
            thresholds: HealthThresholds::default(),
            weights: HealthWeights::default(),
            alerts: default_alert_rules(),
        }
    }
}

const TREND_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct SystemSummary {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_rss_bytes: f64,
    pub memory_vms_bytes: f64,
    pub threads: f64,
    pub open_fds: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HttpSummary {
    pub active_requests: f64,
    pub total_requests: f64,
    pub error_requests: f64,
    pub slow_requests: f64,
    pub request_rate_per_second: f64,
    pub error_rate_percent: f64,
    pub p95_latency_seconds: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertsReport {
    pub breached: Vec<ActiveAlert>,
    pub current_values: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendsReport {
    pub window_minutes: u64,
    pub request_rate_per_second: f64,
    pub error_rate_percent: f64,
    pub active_requests: f64,
    pub entries: Vec<TrendEntry>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub uptime_seconds: f64,
    pub system: SystemSummary,
    pub http: HttpSummary,
    pub health: HealthReport,
    pub alerts: AlertsReport,
}

/// Read-only derived computations over registry snapshots.
#[derive(Debug)]
pub struct Analyzer {
    cfg: AnalyticsConfig,
    rates: RateTracker,
    trends: TrendHistory,
    started: Instant,
}

impl Analyzer {
    pub fn new(cfg: AnalyticsConfig) -> Self {
        let rates = RateTracker::new(Duration::from_secs(cfg.rate_window_seconds));
        let trends = TrendHistory::new(
            TREND_CAPACITY,
            cfg.trend_lookback,
            cfg.trend_deadband_percent,
        );
        Self {
            cfg,
            rates,
            trends,
            started: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Feed the rate windows and trend history from a fresh snapshot.
    /// Called on every sampler tick.
    pub fn observe(&self, snapshot: &RegistrySnapshot) {
        let now = Instant::now();
        self.rates.record_at(
            names::HTTP_REQUESTS_TOTAL,
            now,
            snapshot.counter_total(names::HTTP_REQUESTS_TOTAL),
        );
        self.rates.record_at(
            names::HTTP_REQUEST_ERRORS_TOTAL,
            now,
            snapshot.counter_total(names::HTTP_REQUEST_ERRORS_TOTAL),
        );
        self.rates.record_at(
            names::APP_CPU_SECONDS_TOTAL,
            now,
            snapshot.counter_total(names::APP_CPU_SECONDS_TOTAL),
        );

        self.trends.push(TrendPoint {
            request_rate: self.request_rate(),
            error_rate_percent: self.error_rate_percent(),
            p95_latency_seconds: self.p95_latency_seconds(snapshot),
        });
    }

    pub fn request_rate(&self) -> f64 {
        self.rates.rate(names::HTTP_REQUESTS_TOTAL)
    }

    /// Windowed error percentage: rate(errors) / rate(requests) × 100.
    pub fn error_rate_percent(&self) -> f64 {
        let requests = self.rates.rate(names::HTTP_REQUESTS_TOTAL);
        if requests <= 0.0 {
            return 0.0;
        }
        (self.rates.rate(names::HTTP_REQUEST_ERRORS_TOTAL) / requests * 100.0).min(100.0)
    }

    pub fn p95_latency_seconds(&self, snapshot: &RegistrySnapshot) -> Option<f64> {
        let merged = snapshot.histogram_merged(names::HTTP_REQUEST_DURATION_SECONDS)?;
        percentile(&merged, 0.95).filter(|p| p.is_finite())
    }

    pub fn system_summary(&self, snapshot: &RegistrySnapshot) -> SystemSummary {
        SystemSummary {
            cpu_percent: snapshot
                .gauge_value(names::APP_CPU_USAGE_PERCENT)
                .unwrap_or(0.0),
            memory_percent: snapshot
                .gauge_value(names::APP_MEMORY_USAGE_PERCENT)
                .unwrap_or(0.0),
            memory_rss_bytes: snapshot
                .gauge_value(names::APP_MEMORY_RESIDENT_BYTES)
                .unwrap_or(0.0),
            memory_vms_bytes: snapshot
                .gauge_value(names::APP_MEMORY_VIRTUAL_BYTES)
                .unwrap_or(0.0),
            threads: snapshot.gauge_value(names::APP_THREADS_TOTAL).unwrap_or(0.0),
            open_fds: snapshot.gauge_value(names::APP_OPEN_FDS),
        }
    }

    pub fn http_summary(&self, snapshot: &RegistrySnapshot) -> HttpSummary {
        HttpSummary {
            active_requests: snapshot
                .gauge_value(names::HTTP_REQUESTS_ACTIVE)
                .unwrap_or(0.0),
            total_requests: snapshot.counter_total(names::HTTP_REQUESTS_TOTAL),
            error_requests: snapshot.counter_total(names::HTTP_REQUEST_ERRORS_TOTAL),
            slow_requests: snapshot.counter_total(names::HTTP_SLOW_REQUESTS_TOTAL),
            request_rate_per_second: self.request_rate(),
            error_rate_percent: self.error_rate_percent(),
            p95_latency_seconds: self.p95_latency_seconds(snapshot),
        }
    }

    /// The derived values alert rules are evaluated against.
    pub fn current_values(&self, snapshot: &RegistrySnapshot) -> BTreeMap<String, f64> {
        let system = self.system_summary(snapshot);
        let http = self.http_summary(snapshot);

        let mut values = BTreeMap::new();
        values.insert(names::KEY_CPU_PERCENT.to_string(), system.cpu_percent);
        values.insert(names::KEY_MEMORY_PERCENT.to_string(), system.memory_percent);
        values.insert(
            names::KEY_ERROR_RATE_PERCENT.to_string(),
            http.error_rate_percent,
        );
        values.insert(names::KEY_ACTIVE_REQUESTS.to_string(), http.active_requests);
        values.insert(
            names::KEY_REQUEST_RATE.to_string(),
            http.request_rate_per_second,
        );
        if let Some(p95) = http.p95_latency_seconds {
            values.insert(names::KEY_P95_LATENCY_SECONDS.to_string(), p95);
        }
        values
    }

    pub fn health(&self, snapshot: &RegistrySnapshot) -> HealthReport {
        let system = self.system_summary(snapshot);
        let http = self.http_summary(snapshot);
        let policy = HealthPolicy {
            thresholds: self.cfg.thresholds.clone(),
            weights: self.cfg.weights.clone(),
        };
        policy.assess(&HealthInputs {
            cpu_percent: system.cpu_percent,
            memory_percent: system.memory_percent,
            error_rate_percent: http.error_rate_percent,
            p95_latency_seconds: http.p95_latency_seconds,
            active_requests: http.active_requests,
        })
    }

    pub fn alerts(&self, snapshot: &RegistrySnapshot) -> AlertsReport {
        let current_values = self.current_values(snapshot);
        AlertsReport {
            breached: evaluate_alerts(&self.cfg.alerts, &current_values),
            current_values,
        }
    }

    pub fn trends(&self, snapshot: &RegistrySnapshot, window_minutes: u64) -> TrendsReport {
        let window = Duration::from_secs(window_minutes.max(1) * 60);
        let request_rate = self.rates.rate_within(names::HTTP_REQUESTS_TOTAL, window);
        let error_rate_percent = if request_rate > 0.0 {
            (self
                .rates
                .rate_within(names::HTTP_REQUEST_ERRORS_TOTAL, window)
                / request_rate
                * 100.0)
                .min(100.0)
        } else {
            0.0
        };

        TrendsReport {
            window_minutes,
            request_rate_per_second: request_rate,
            error_rate_percent,
            active_requests: snapshot
                .gauge_value(names::HTTP_REQUESTS_ACTIVE)
                .unwrap_or(0.0),
            entries: self.trends.classify(),
            recommendations: recommendations(request_rate, error_rate_percent),
        }
    }

    pub fn export(&self, snapshot: &RegistrySnapshot) -> ExportReport {
        ExportReport {
            uptime_seconds: self.uptime_seconds(),
            system: self.system_summary(snapshot),
            http: self.http_summary(snapshot),
            health: self.health(snapshot),
            alerts: self.alerts(snapshot),
        }
    }
}

fn recommendations(request_rate: f64, error_rate_percent: f64) -> Vec<String> {
    let mut out = Vec::new();
    if request_rate > 100.0 {
        out.push("Consider request rate limiting at the edge".to_string());
    }
    if error_rate_percent > 5.0 {
        out.push("Investigate elevated error rate in application logs".to_string());
    }
    if request_rate > 50.0 && error_rate_percent > 2.0 {
        out.push("High traffic with elevated errors - consider scaling horizontally".to_string());
    }
    if out.is_empty() {
        out.push("System operating within normal parameters".to_string());
    }
    out
}
