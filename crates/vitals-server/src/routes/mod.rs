//! HTTP route handlers.

pub mod data;
pub mod health;
pub mod metrics;

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::app_state::{unix_timestamp, AppState};

/// Service info at `/`.
pub async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "uptime_seconds": state.uptime_seconds(),
        "metrics_endpoint": state.cfg().metrics.path,
        "health_endpoint": "/health",
    }))
}

/// JSON 404 for unmatched routes. These requests still pass through the
/// instrumentation middleware under the `not_found` endpoint label.
pub async fn not_found(method: Method, uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": "The requested resource was not found",
            "path": uri.path(),
            "method": method.as_str(),
        })),
    )
        .into_response()
}

pub(crate) fn timestamp() -> f64 {
    unix_timestamp()
}
