//! Metric descriptors (immutable once registered).

use serde::Serialize;

use crate::error::{MetricsError, Result};

/// The four exposition kinds the registry supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Info,
}

impl MetricKind {
    /// Keyword used on `# TYPE` lines. Info families render as gauges.
    pub fn exposition_keyword(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Info => "gauge",
        }
    }
}

/// Immutable description of one metric family. `name` is the process-wide
/// unique key; the label schema and bucket layout are fixed at registration.
#[derive(Debug, Clone)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub label_names: Vec<String>,
    /// Ascending finite upper bounds; histograms only. The implicit `+Inf`
    /// overflow bucket is not stored.
    pub buckets: Vec<f64>,
}

impl MetricDescriptor {
    pub fn counter(name: &str, help: &str, label_names: &[&str]) -> Self {
        Self::new(name, help, MetricKind::Counter, label_names, Vec::new())
    }

    pub fn gauge(name: &str, help: &str, label_names: &[&str]) -> Self {
        Self::new(name, help, MetricKind::Gauge, label_names, Vec::new())
    }

    pub fn histogram(name: &str, help: &str, label_names: &[&str], buckets: &[f64]) -> Self {
        Self::new(name, help, MetricKind::Histogram, label_names, buckets.to_vec())
    }

    pub fn info(name: &str, help: &str, label_names: &[&str]) -> Self {
        Self::new(name, help, MetricKind::Info, label_names, Vec::new())
    }

    fn new(
        name: &str,
        help: &str,
        kind: MetricKind,
        label_names: &[&str],
        buckets: Vec<f64>,
    ) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            kind,
            label_names: label_names.iter().map(|s| s.to_string()).collect(),
            buckets,
        }
    }

    /// Registration-time validation: sane name, histogram buckets strictly
    /// ascending and finite.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(MetricsError::InvalidDescriptor("empty metric name".into()));
        }
        if self.kind == MetricKind::Histogram {
            if self.buckets.is_empty() {
                return Err(MetricsError::InvalidDescriptor(format!(
                    "{}: histogram requires at least one bucket",
                    self.name
                )));
            }
            for pair in self.buckets.windows(2) {
                if pair[1] <= pair[0] {
                    return Err(MetricsError::InvalidDescriptor(format!(
                        "{}: buckets must be strictly ascending",
                        self.name
                    )));
                }
            }
            if self.buckets.iter().any(|b| !b.is_finite()) {
                return Err(MetricsError::InvalidDescriptor(format!(
                    "{}: buckets must be finite (the +Inf bucket is implicit)",
                    self.name
                )));
            }
        } else if !self.buckets.is_empty() {
            return Err(MetricsError::InvalidDescriptor(format!(
                "{}: buckets are only valid on histograms",
                self.name
            )));
        }
        Ok(())
    }

    /// Schema identity used for idempotent re-registration: the help text is
    /// free to differ, everything else must match.
    pub fn schema_matches(&self, other: &MetricDescriptor) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.label_names == other.label_names
            && self.buckets == other.buckets
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn validates_ascending_buckets() {
        let ok = MetricDescriptor::histogram("d", "h", &[], &[0.1, 0.5, 1.0]);
        assert!(ok.validate().is_ok());

        let bad = MetricDescriptor::histogram("d", "h", &[], &[0.5, 0.5]);
        assert!(bad.validate().is_err());

        let inf = MetricDescriptor::histogram("d", "h", &[], &[1.0, f64::INFINITY]);
        assert!(inf.validate().is_err());
    }

    #[test]
    fn rejects_buckets_on_counters() {
        let desc = MetricDescriptor {
            buckets: vec![1.0],
            ..MetricDescriptor::counter("c", "h", &[])
        };
        assert!(desc.validate().is_err());
    }

    #[test]
    fn schema_match_ignores_help() {
        let a = MetricDescriptor::counter("c", "one", &["method"]);
        let b = MetricDescriptor::counter("c", "two", &["method"]);
        let c = MetricDescriptor::counter("c", "one", &["endpoint"]);
        assert!(a.schema_matches(&b));
        assert!(!a.schema_matches(&c));
    }
}
