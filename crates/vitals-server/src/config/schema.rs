use serde::Deserialize;
use vitals_core::analytics::AnalyticsConfig;
use vitals_core::error::{MetricsError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub sampler: SamplerSection,

    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricsError::Config(
                "unsupported config version (expected 1)".into(),
            ));
        }
        self.metrics.validate()?;
        self.sampler.validate()?;

        if !(0.0..=100.0).contains(&self.analytics.trend_deadband_percent) {
            return Err(MetricsError::Config(
                "analytics.trend_deadband_percent must be between 0 and 100".into(),
            ));
        }
        let w = &self.analytics.weights;
        if [w.cpu, w.memory, w.error_rate, w.latency]
            .iter()
            .any(|v| *v < 0.0)
        {
            return Err(MetricsError::Config(
                "analytics.weights must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
            sampler: SamplerSection::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_metrics_path")]
    pub path: String,

    /// Extra paths the instrumentation middleware skips entirely.
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    #[serde(default = "default_duration_buckets")]
    pub duration_buckets: Vec<f64>,

    #[serde(default = "default_size_buckets")]
    pub size_buckets: Vec<f64>,

    #[serde(default = "default_slow_request_threshold")]
    pub slow_request_threshold_seconds: f64,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            exclude_paths: Vec::new(),
            duration_buckets: default_duration_buckets(),
            size_buckets: default_size_buckets(),
            slow_request_threshold_seconds: default_slow_request_threshold(),
        }
    }
}

impl MetricsSection {
    /// The scrape path itself is always excluded from instrumentation.
    pub fn is_excluded(&self, path: &str) -> bool {
        path == self.path || self.exclude_paths.iter().any(|p| p == path)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.path.starts_with('/') {
            return Err(MetricsError::Config(
                "metrics.path must start with '/'".into(),
            ));
        }
        if self.slow_request_threshold_seconds <= 0.0 {
            return Err(MetricsError::Config(
                "metrics.slow_request_threshold_seconds must be positive".into(),
            ));
        }
        for buckets in [&self.duration_buckets, &self.size_buckets] {
            if buckets.is_empty() {
                return Err(MetricsError::Config(
                    "metrics bucket lists must not be empty".into(),
                ));
            }
            if buckets.windows(2).any(|w| w[1] <= w[0]) {
                return Err(MetricsError::Config(
                    "metrics bucket lists must be strictly ascending".into(),
                ));
            }
        }
        Ok(())
    }
}

fn default_metrics_path() -> String {
    "/metrics".into()
}

fn default_duration_buckets() -> Vec<f64> {
    vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0]
}

fn default_size_buckets() -> Vec<f64> {
    vec![
        1.0,
        10.0,
        100.0,
        1_000.0,
        10_000.0,
        100_000.0,
        1_000_000.0,
        10_000_000.0,
    ]
}

fn default_slow_request_threshold() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplerSection {
    #[serde(default = "default_enable_system_metrics")]
    pub enable_system_metrics: bool,

    #[serde(default = "default_collection_interval")]
    pub collection_interval_seconds: u64,
}

impl Default for SamplerSection {
    fn default() -> Self {
        Self {
            enable_system_metrics: default_enable_system_metrics(),
            collection_interval_seconds: default_collection_interval(),
        }
    }
}

impl SamplerSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=3600).contains(&self.collection_interval_seconds) {
            return Err(MetricsError::Config(
                "sampler.collection_interval_seconds must be between 1 and 3600".into(),
            ));
        }
        Ok(())
    }
}

fn default_enable_system_metrics() -> bool {
    true
}

fn default_collection_interval() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use crate::config::load_from_str;

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg = load_from_str("version: 1\n").unwrap();
        assert_eq!(cfg.server.listen, "0.0.0.0:8000");
        assert_eq!(cfg.metrics.path, "/metrics");
        assert_eq!(cfg.metrics.slow_request_threshold_seconds, 1.0);
        assert_eq!(cfg.sampler.collection_interval_seconds, 10);
        assert!(cfg.sampler.enable_system_metrics);
        assert_eq!(cfg.analytics.rate_window_seconds, 300);
        assert!(!cfg.analytics.alerts.is_empty());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = load_from_str("version: 1\nmetrics:\n  pathh: /m\n");
        assert!(err.is_err());
    }

    #[test]
    fn wrong_version_is_rejected() {
        assert!(load_from_str("version: 2\n").is_err());
    }

    #[test]
    fn descending_buckets_are_rejected() {
        let err = load_from_str("version: 1\nmetrics:\n  duration_buckets: [1.0, 0.5]\n");
        assert!(err.is_err());
    }

    #[test]
    fn interval_range_is_enforced() {
        let err = load_from_str("version: 1\nsampler:\n  collection_interval_seconds: 0\n");
        assert!(err.is_err());
    }

    #[test]
    fn metrics_path_is_always_excluded() {
        let cfg = load_from_str("version: 1\nmetrics:\n  exclude_paths: [\"/docs\"]\n").unwrap();
        assert!(cfg.metrics.is_excluded("/metrics"));
        assert!(cfg.metrics.is_excluded("/docs"));
        assert!(!cfg.metrics.is_excluded("/api/v1/data"));
    }

    #[test]
    fn threshold_overrides_parse() {
        let cfg = load_from_str(
            "version: 1\nanalytics:\n  thresholds:\n    cpu_percent: 50.0\n  alerts:\n    - metric_key: cpu_percent\n      comparator: above\n      limit: 50.0\n      severity: critical\n",
        )
        .unwrap();
        assert_eq!(cfg.analytics.thresholds.cpu_percent, 50.0);
        assert_eq!(cfg.analytics.alerts.len(), 1);
    }
}
