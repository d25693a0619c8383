//! Periodic process-level sampling.
//!
//! One background task refreshes sysinfo for our own PID and writes the
//! results into registry gauges/counters. A failed tick logs and skips;
//! previous gauge values stay in place. Shutdown is cooperative and lands on
//! tick boundaries only, never mid-sample.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use vitals_core::error::{MetricsError, Result};
use vitals_core::metric::{Counter, Gauge, MetricDescriptor, Registry};
use vitals_core::names;

use crate::app_state::AppState;

struct SystemHandles {
    cpu_seconds_total: Counter,
    cpu_usage_percent: Gauge,
    memory_resident_bytes: Gauge,
    memory_virtual_bytes: Gauge,
    memory_usage_percent: Gauge,
    threads_total: Gauge,
    open_fds: Gauge,
    uptime_seconds: Gauge,
    runtime_workers: Gauge,
    runtime_alive_tasks: Gauge,
}

impl SystemHandles {
    fn register(registry: &Registry) -> Result<Self> {
        fn gauge(registry: &Registry, name: &str, help: &str) -> Result<Gauge> {
            registry
                .register(MetricDescriptor::gauge(name, help, &[]))?
                .gauge(&[])
        }

        Ok(Self {
            cpu_seconds_total: registry
                .register(MetricDescriptor::counter(
                    names::APP_CPU_SECONDS_TOTAL,
                    "Total user and system CPU time spent by the application in seconds",
                    &[],
                ))?
                .counter(&[])?,
            cpu_usage_percent: gauge(
                registry,
                names::APP_CPU_USAGE_PERCENT,
                "Current CPU usage percentage of the application",
            )?,
            memory_resident_bytes: gauge(
                registry,
                names::APP_MEMORY_RESIDENT_BYTES,
                "Physical memory currently used by the application in bytes",
            )?,
            memory_virtual_bytes: gauge(
                registry,
                names::APP_MEMORY_VIRTUAL_BYTES,
                "Virtual memory allocated by the application in bytes",
            )?,
            memory_usage_percent: gauge(
                registry,
                names::APP_MEMORY_USAGE_PERCENT,
                "Memory usage percentage of the application",
            )?,
            threads_total: gauge(
                registry,
                names::APP_THREADS_TOTAL,
                "Number of OS threads in the application process",
            )?,
            open_fds: gauge(
                registry,
                names::APP_OPEN_FDS,
                "Number of open file descriptors for the application",
            )?,
            uptime_seconds: gauge(
                registry,
                names::APP_UPTIME_SECONDS,
                "Time in seconds since the application started",
            )?,
            runtime_workers: gauge(
                registry,
                names::APP_RUNTIME_WORKERS,
                "Number of async runtime worker threads",
            )?,
            runtime_alive_tasks: gauge(
                registry,
                names::APP_RUNTIME_ALIVE_TASKS,
                "Number of tasks currently alive on the async runtime",
            )?,
        })
    }
}

pub struct SystemSampler {
    state: AppState,
    handles: SystemHandles,
    sys: System,
    pid: Pid,
    core_count: f64,
    last_cpu_time_ms: Option<u64>,
    ticks: Arc<AtomicU64>,
}

impl SystemSampler {
    /// Register the process-metric families and prepare the sysinfo handle.
    /// Call before serving so registration conflicts fail the boot.
    pub fn new(state: AppState) -> Result<Self> {
        let handles = SystemHandles::register(state.registry())?;
        let sys = System::new_with_specifics(
            RefreshKind::nothing().with_processes(ProcessRefreshKind::everything()),
        );
        let pid = sysinfo::get_current_pid()
            .map_err(|e| MetricsError::Sampling(format!("cannot resolve own pid: {e}")))?;
        let core_count = std::thread::available_parallelism()
            .map(|n| n.get() as f64)
            .unwrap_or(1.0);
        let ticks = state.sampler_ticks();

        Ok(Self {
            state,
            handles,
            sys,
            pid,
            core_count,
            last_cpu_time_ms: None,
            ticks,
        })
    }

    /// Take one sample and push it into the registry. CPU usage needs two
    /// refreshes, so the first tick reports 0.
    pub fn sample_once(&mut self) -> Result<()> {
        self.sys
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
        self.sys.refresh_memory();

        let process = self
            .sys
            .process(self.pid)
            .ok_or_else(|| MetricsError::Sampling("own process not visible".into()))?;

        let cpu = (process.cpu_usage() as f64).clamp(0.0, 100.0 * self.core_count);
        self.handles.cpu_usage_percent.set(cpu);

        // Monotone CPU-seconds counter from successive raw samples; the first
        // sample only establishes the baseline.
        let cpu_time_ms = process.accumulated_cpu_time();
        if let Some(last) = self.last_cpu_time_ms {
            let delta_seconds = cpu_time_ms.saturating_sub(last) as f64 / 1000.0;
            if delta_seconds > 0.0 {
                if let Err(e) = self.handles.cpu_seconds_total.inc(delta_seconds) {
                    tracing::warn!(error = %e, "cpu seconds update dropped");
                }
            }
        }
        self.last_cpu_time_ms = Some(cpu_time_ms);

        let rss = process.memory() as f64;
        self.handles.memory_resident_bytes.set(rss);
        self.handles
            .memory_virtual_bytes
            .set(process.virtual_memory() as f64);

        let total_memory = self.sys.total_memory() as f64;
        if total_memory > 0.0 {
            self.handles
                .memory_usage_percent
                .set(rss / total_memory * 100.0);
        }

        self.handles
            .threads_total
            .set(process.tasks().map_or(1, |tasks| tasks.len()) as f64);

        if let Some(fds) = open_fd_count() {
            self.handles.open_fds.set(fds as f64);
        }

        self.handles
            .uptime_seconds
            .set(self.state.uptime_seconds());

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let metrics = runtime.metrics();
            self.handles
                .runtime_workers
                .set(metrics.num_workers() as f64);
            self.handles
                .runtime_alive_tasks
                .set(metrics.num_alive_tasks() as f64);
        }

        self.ticks.fetch_add(1, Ordering::Relaxed);

        // Feed the analytics rate windows and trend history on the same tick.
        self.state
            .analyzer()
            .observe(&self.state.registry().snapshot());

        Ok(())
    }

    /// Start the periodic task. The watch channel requests shutdown; the loop
    /// only observes it between ticks, so an in-flight sample always finishes.
    pub fn spawn(mut self, period: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.sample_once() {
                            tracing::warn!(error = %e, "system sample skipped");
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
            tracing::info!("system metrics sampler stopped");
        })
    }
}

#[cfg(target_os = "linux")]
fn open_fd_count() -> Option<usize> {
    std::fs::read_dir("/proc/self/fd")
        .ok()
        .map(|entries| entries.count())
}

#[cfg(not(target_os = "linux"))]
fn open_fd_count() -> Option<usize> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;

    #[tokio::test]
    async fn sampling_populates_process_gauges() {
        let state = AppState::new(ServiceConfig::default()).unwrap();
        let mut sampler = SystemSampler::new(state.clone()).unwrap();

        sampler.sample_once().unwrap();
        assert!(state.sampler_has_sampled());

        let snap = state.registry().snapshot();
        let rss = snap
            .gauge_value(names::APP_MEMORY_RESIDENT_BYTES)
            .unwrap();
        assert!(rss > 0.0);
        assert!(snap.gauge_value(names::APP_THREADS_TOTAL).unwrap() >= 1.0);
        // first CPU sample carries no usable delta
        assert!(snap.gauge_value(names::APP_CPU_USAGE_PERCENT).unwrap() >= 0.0);
        assert_eq!(snap.counter_total(names::APP_CPU_SECONDS_TOTAL), 0.0);
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let state = AppState::new(ServiceConfig::default()).unwrap();
        let sampler = SystemSampler::new(state).unwrap();
        let (tx, rx) = watch::channel(false);

        let handle = sampler.spawn(Duration::from_millis(10), rx);
        tokio::time::sleep(Duration::from_millis(40)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
