//! HTTP request instrumentation.
//!
//! `HttpMetrics` owns the registered request-metric families; the middleware
//! in [`middleware`] feeds it one `RequestSample` per completed request.
//! Recording failures are logged and dropped — a metrics bug must never alter
//! the response the instrumented request returns.

pub mod middleware;

use std::sync::Arc;

use vitals_core::error::Result;
use vitals_core::metric::{Gauge, MetricDescriptor, MetricHandle, Registry};
use vitals_core::names;

/// Endpoint label used when no route template matched.
pub const NOT_FOUND_ENDPOINT: &str = "not_found";

/// Everything observed about one completed request. Ephemeral; only used to
/// update series.
#[derive(Debug, Clone)]
pub struct RequestSample {
    pub method: String,
    pub endpoint: String,
    pub status_code: u16,
    pub duration_seconds: f64,
    pub request_bytes: Option<f64>,
    pub response_bytes: Option<f64>,
}

/// Error class derived from the status code; `None` below 400.
fn error_type(status_code: u16) -> Option<&'static str> {
    match status_code {
        400..=499 => Some("client_error"),
        500..=599 => Some("server_error"),
        _ => None,
    }
}

#[derive(Clone)]
pub struct HttpMetrics {
    inner: Arc<HttpMetricsInner>,
}

struct HttpMetricsInner {
    requests_total: MetricHandle,
    duration_seconds: MetricHandle,
    request_size_bytes: MetricHandle,
    response_size_bytes: MetricHandle,
    errors_total: MetricHandle,
    slow_requests_total: MetricHandle,
    requests_active: Gauge,
    slow_threshold_seconds: f64,
}

impl HttpMetrics {
    /// Register every request-metric family. Fails fast on a registration
    /// conflict; never fails at runtime afterwards.
    pub fn register(registry: &Registry, cfg: &crate::config::MetricsSection) -> Result<Self> {
        let requests_total = registry.register(MetricDescriptor::counter(
            names::HTTP_REQUESTS_TOTAL,
            "Total HTTP requests",
            &["method", "endpoint", "status_code"],
        ))?;
        let duration_seconds = registry.register(MetricDescriptor::histogram(
            names::HTTP_REQUEST_DURATION_SECONDS,
            "HTTP request duration in seconds",
            &["method", "endpoint"],
            &cfg.duration_buckets,
        ))?;
        let request_size_bytes = registry.register(MetricDescriptor::histogram(
            names::HTTP_REQUEST_SIZE_BYTES,
            "HTTP request size in bytes",
            &["method", "endpoint"],
            &cfg.size_buckets,
        ))?;
        let response_size_bytes = registry.register(MetricDescriptor::histogram(
            names::HTTP_RESPONSE_SIZE_BYTES,
            "HTTP response size in bytes",
            &["method", "endpoint", "status_code"],
            &cfg.size_buckets,
        ))?;
        let errors_total = registry.register(MetricDescriptor::counter(
            names::HTTP_REQUEST_ERRORS_TOTAL,
            "Total HTTP request errors",
            &["method", "endpoint", "error_type"],
        ))?;
        let slow_requests_total = registry.register(MetricDescriptor::counter(
            names::HTTP_SLOW_REQUESTS_TOTAL,
            "Total HTTP requests slower than the configured threshold",
            &["method", "endpoint"],
        ))?;
        let requests_active = registry
            .register(MetricDescriptor::gauge(
                names::HTTP_REQUESTS_ACTIVE,
                "Number of HTTP requests currently being processed",
                &[],
            ))?
            .gauge(&[])?;

        Ok(Self {
            inner: Arc::new(HttpMetricsInner {
                requests_total,
                duration_seconds,
                request_size_bytes,
                response_size_bytes,
                errors_total,
                slow_requests_total,
                requests_active,
                slow_threshold_seconds: cfg.slow_request_threshold_seconds,
            }),
        })
    }

    /// Increment the in-flight gauge and return the guard that decrements it.
    /// The decrement runs on drop, so it happens on every exit path the
    /// request can take.
    pub fn request_started(&self) -> InFlightGuard {
        self.inner.requests_active.add(1.0);
        InFlightGuard {
            gauge: self.inner.requests_active.clone(),
        }
    }

    pub fn active_requests(&self) -> f64 {
        self.inner.requests_active.value()
    }

    /// Record the terminal metrics for one completed request.
    pub fn record(&self, sample: &RequestSample) {
        let status = sample.status_code.to_string();
        let method = sample.method.as_str();
        let endpoint = sample.endpoint.as_str();

        self.inc(
            &self.inner.requests_total,
            &[method, endpoint, status.as_str()],
            1.0,
        );
        self.observe(
            &self.inner.duration_seconds,
            &[method, endpoint],
            sample.duration_seconds,
        );
        if let Some(bytes) = sample.request_bytes {
            self.observe(&self.inner.request_size_bytes, &[method, endpoint], bytes);
        }
        if let Some(bytes) = sample.response_bytes {
            self.observe(
                &self.inner.response_size_bytes,
                &[method, endpoint, status.as_str()],
                bytes,
            );
        }
        if let Some(kind) = error_type(sample.status_code) {
            self.inc(&self.inner.errors_total, &[method, endpoint, kind], 1.0);
        }
        if sample.duration_seconds > self.inner.slow_threshold_seconds {
            self.inc(&self.inner.slow_requests_total, &[method, endpoint], 1.0);
        }
    }

    fn inc(&self, handle: &MetricHandle, labels: &[&str], delta: f64) {
        match handle.counter(labels) {
            Ok(counter) => {
                if let Err(e) = counter.inc(delta) {
                    tracing::warn!(metric = handle.name(), error = %e, "counter update dropped");
                }
            }
            Err(e) => {
                tracing::warn!(metric = handle.name(), error = %e, "counter lookup failed");
            }
        }
    }

    fn observe(&self, handle: &MetricHandle, labels: &[&str], value: f64) {
        match handle.histogram(labels) {
            Ok(histogram) => histogram.observe(value),
            Err(e) => {
                tracing::warn!(metric = handle.name(), error = %e, "histogram lookup failed");
            }
        }
    }
}

/// Scoped in-flight marker. Dropping it decrements `http_requests_active`,
/// whether the handler returned, failed, or the connection went away.
pub struct InFlightGuard {
    gauge: Gauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.add(-1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsSection;
    use vitals_core::metric::Registry;

    fn http_metrics() -> (Registry, HttpMetrics) {
        let registry = Registry::new();
        let metrics = HttpMetrics::register(&registry, &MetricsSection::default()).unwrap();
        (registry, metrics)
    }

    fn sample(status: u16, duration: f64) -> RequestSample {
        RequestSample {
            method: "GET".into(),
            endpoint: "/api/v1/data/{id}".into(),
            status_code: status,
            duration_seconds: duration,
            request_bytes: Some(64.0),
            response_bytes: Some(1024.0),
        }
    }

    #[test]
    fn register_twice_is_idempotent() {
        let registry = Registry::new();
        HttpMetrics::register(&registry, &MetricsSection::default()).unwrap();
        HttpMetrics::register(&registry, &MetricsSection::default()).unwrap();
    }

    #[test]
    fn completed_request_updates_every_family() {
        let (registry, metrics) = http_metrics();
        metrics.record(&sample(200, 0.05));

        let snap = registry.snapshot();
        assert_eq!(snap.counter_total(names::HTTP_REQUESTS_TOTAL), 1.0);
        assert_eq!(snap.counter_total(names::HTTP_REQUEST_ERRORS_TOTAL), 0.0);
        assert_eq!(snap.counter_total(names::HTTP_SLOW_REQUESTS_TOTAL), 0.0);
        let durations = snap
            .histogram_merged(names::HTTP_REQUEST_DURATION_SECONDS)
            .unwrap();
        assert_eq!(durations.count, 1);
    }

    #[test]
    fn status_classes_map_to_error_types() {
        let (registry, metrics) = http_metrics();
        metrics.record(&sample(404, 0.01));
        metrics.record(&sample(500, 0.01));
        metrics.record(&sample(302, 0.01));

        let snap = registry.snapshot();
        let errors = snap.family(names::HTTP_REQUEST_ERRORS_TOTAL).unwrap();
        let types: Vec<&str> = errors
            .series
            .iter()
            .map(|s| s.label_values[2].as_str())
            .collect();
        assert!(types.contains(&"client_error"));
        assert!(types.contains(&"server_error"));
        assert_eq!(snap.counter_total(names::HTTP_REQUEST_ERRORS_TOTAL), 2.0);
    }

    #[test]
    fn slow_requests_are_counted_past_the_threshold() {
        let (registry, metrics) = http_metrics();
        metrics.record(&sample(200, 0.5));
        metrics.record(&sample(200, 1.5));

        let snap = registry.snapshot();
        assert_eq!(snap.counter_total(names::HTTP_SLOW_REQUESTS_TOTAL), 1.0);
    }

    #[test]
    fn in_flight_gauge_balances_across_threads() {
        let (registry, metrics) = http_metrics();

        let mut joins = Vec::new();
        for _ in 0..8 {
            let metrics = metrics.clone();
            joins.push(std::thread::spawn(move || {
                for _ in 0..500 {
                    let guard = metrics.request_started();
                    assert!(metrics.active_requests() >= 1.0);
                    drop(guard);
                }
            }));
        }
        for j in joins {
            j.join().unwrap();
        }

        let snap = registry.snapshot();
        assert_eq!(snap.gauge_value(names::HTTP_REQUESTS_ACTIVE), Some(0.0));
    }

    #[test]
    fn guard_decrements_even_when_the_handler_panics() {
        let (_, metrics) = http_metrics();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = metrics.request_started();
            panic!("handler blew up");
        }));
        assert!(result.is_err());
        assert_eq!(metrics.active_requests(), 0.0);
    }
}
