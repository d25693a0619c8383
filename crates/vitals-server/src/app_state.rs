//! Shared application state.
//!
//! The registry is constructed exactly once here and threaded explicitly to
//! every writer and reader (middleware, sampler, analytics, exposition).
//! `new` returns `Result` so a registration conflict fails the boot instead
//! of surfacing mid-traffic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use vitals_core::analytics::Analyzer;
use vitals_core::error::Result;
use vitals_core::metric::{MetricDescriptor, Registry};
use vitals_core::names;

use crate::config::ServiceConfig;
use crate::http::HttpMetrics;
use crate::routes::data::DataStore;

/// Seconds since the unix epoch, as the JSON endpoints report time.
pub(crate) fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServiceConfig,
    registry: Arc<Registry>,
    http: HttpMetrics,
    analyzer: Analyzer,
    data: DataStore,
    started: Instant,
    sampler_ticks: Arc<AtomicU64>,
}

impl AppState {
    /// Build application state: construct the registry and register every
    /// metric family up front. Returns `Err` on any registration conflict.
    pub fn new(cfg: ServiceConfig) -> Result<Self> {
        cfg.validate()?;

        let registry = Arc::new(Registry::new());
        let http = HttpMetrics::register(&registry, &cfg.metrics)?;
        let analyzer = Analyzer::new(cfg.analytics.clone());

        let info = registry.register(MetricDescriptor::info(
            names::APP_INFO,
            "Application process information",
            &[],
        ))?;
        info.set_info(&[
            ("name", env!("CARGO_PKG_NAME")),
            ("version", env!("CARGO_PKG_VERSION")),
            ("pid", &std::process::id().to_string()),
        ]);

        registry
            .register(MetricDescriptor::gauge(
                names::APP_START_TIME_SECONDS,
                "Start time of the application since unix epoch in seconds",
                &[],
            ))?
            .gauge(&[])?
            .set(unix_timestamp());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                http,
                analyzer,
                data: DataStore::new(),
                started: Instant::now(),
                sampler_ticks: Arc::new(AtomicU64::new(0)),
            }),
        })
    }

    pub fn cfg(&self) -> &ServiceConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    pub fn http_metrics(&self) -> &HttpMetrics {
        &self.inner.http
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.inner.analyzer
    }

    pub fn data(&self) -> &DataStore {
        &self.inner.data
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.inner.started.elapsed().as_secs_f64()
    }

    pub fn sampler_ticks(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.inner.sampler_ticks)
    }

    pub fn sampler_has_sampled(&self) -> bool {
        self.inner.sampler_ticks.load(Ordering::Relaxed) > 0
    }
}
