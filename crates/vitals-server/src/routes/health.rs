//! Liveness / readiness probes and the detailed health view.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::json;

use crate::app_state::AppState;

use super::timestamp;

const READY_AFTER_SECONDS: f64 = 5.0;

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": timestamp(),
        "uptime_seconds": state.uptime_seconds(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Detailed health: embeds the registry-derived system/HTTP snapshot and the
/// issues list computed against the configured thresholds.
pub async fn detailed(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.registry().snapshot();
    let analyzer = state.analyzer();
    let system = analyzer.system_summary(&snapshot);
    let http = analyzer.http_summary(&snapshot);
    let thresholds = &state.cfg().analytics.thresholds;

    let mut status = "healthy";
    let mut issues: Vec<String> = Vec::new();

    if system.cpu_percent > thresholds.cpu_percent {
        status = "warning";
        issues.push(format!("High CPU usage: {:.1}%", system.cpu_percent));
    }
    if system.memory_percent > thresholds.memory_percent {
        status = if status == "healthy" { "warning" } else { "critical" };
        issues.push(format!("High memory usage: {:.1}%", system.memory_percent));
    }
    if http.active_requests > thresholds.active_requests {
        if status == "healthy" {
            status = "warning";
        }
        issues.push(format!(
            "High number of active requests: {}",
            http.active_requests
        ));
    }

    Json(json!({
        "status": status,
        "timestamp": timestamp(),
        "uptime_seconds": state.uptime_seconds(),
        "system": system,
        "http": http,
        "issues": issues,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn live() -> Json<serde_json::Value> {
    Json(json!({ "status": "alive" }))
}

/// Readiness: metrics collection must have produced a sample (when enabled)
/// and the process must have been up for a few seconds.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let sampler_ok =
        !state.cfg().sampler.enable_system_metrics || state.sampler_has_sampled();
    let uptime_ok = state.uptime_seconds() > READY_AFTER_SECONDS;
    let ready = sampler_ok && uptime_ok;

    let body = json!({
        "status": if ready { "ready" } else { "not_ready" },
        "checks": {
            "metrics_collection": if sampler_ok { "pass" } else { "fail" },
            "uptime": if uptime_ok { "pass" } else { "fail" },
        },
        "timestamp": timestamp(),
    });
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}
