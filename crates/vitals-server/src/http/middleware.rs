//! axum middleware wrapping every inbound request.
//!
//! The in-flight guard is taken before the handler runs and released by drop
//! afterwards, so the active count balances on normal returns, handler
//! failures, and aborted connections alike. All other metrics are recorded
//! from the completed response.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app_state::AppState;

use super::{RequestSample, NOT_FOUND_ENDPOINT};

fn content_length(headers: &HeaderMap) -> Option<f64> {
    headers
        .get(axum::http::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse::<f64>()
        .ok()
}

pub async fn track_requests(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if state.cfg().metrics.is_excluded(req.uri().path()) {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    // Route template, never the raw path: cardinality stays bounded by the
    // route table. Unmatched requests collapse into one sentinel series.
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NOT_FOUND_ENDPOINT.to_string());
    let request_bytes = content_length(req.headers());

    let started = Instant::now();
    let _in_flight = state.http_metrics().request_started();

    let response = next.run(req).await;

    state.http_metrics().record(&RequestSample {
        method,
        endpoint,
        status_code: response.status().as_u16(),
        duration_seconds: started.elapsed().as_secs_f64(),
        request_bytes,
        response_bytes: content_length(response.headers()),
    });

    response
}
