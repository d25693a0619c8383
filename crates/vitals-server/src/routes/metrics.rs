//! `/metrics` family: text exposition plus the analyzer's JSON read surface.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use vitals_core::analytics::{AlertsReport, ExportReport, HealthReport, TrendsReport};
use vitals_core::expose;

use crate::app_state::AppState;

use super::timestamp;

/// Text exposition of a full registry snapshot. Always 200; an empty registry
/// is an empty (still valid) body.
pub async fn exposition(State(state): State<AppState>) -> Response {
    let body = expose::render(&state.registry().snapshot());
    (
        [(header::CONTENT_TYPE, expose::TEXT_FORMAT_CONTENT_TYPE)],
        body,
    )
        .into_response()
}

/// Human-readable aggregate of the current system and HTTP signals.
pub async fn summary(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.registry().snapshot();
    let analyzer = state.analyzer();
    Json(json!({
        "timestamp": timestamp(),
        "system": analyzer.system_summary(&snapshot),
        "http": analyzer.http_summary(&snapshot),
        "health": analyzer.health(&snapshot),
        "application": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": state.uptime_seconds(),
        },
    }))
}

pub async fn health_score(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.analyzer().health(&state.registry().snapshot()))
}

pub async fn alerts(State(state): State<AppState>) -> Json<AlertsReport> {
    Json(state.analyzer().alerts(&state.registry().snapshot()))
}

#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,
}

fn default_window_minutes() -> u64 {
    5
}

pub async fn trends(
    State(state): State<AppState>,
    Query(query): Query<TrendsQuery>,
) -> Json<TrendsReport> {
    Json(
        state
            .analyzer()
            .trends(&state.registry().snapshot(), query.window_minutes),
    )
}

pub async fn export(State(state): State<AppState>) -> Json<ExportReport> {
    Json(state.analyzer().export(&state.registry().snapshot()))
}
