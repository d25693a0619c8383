//! Axum router wiring.
//!
//! Every route sits behind the instrumentation middleware; the scrape path
//! and configured exclusions are skipped inside the middleware itself so the
//! route table stays flat.

use axum::{
    middleware,
    routing::get,
    Router,
};

use crate::app_state::AppState;
use crate::http::middleware::track_requests;
use crate::routes;

pub fn build_router(state: AppState) -> Router {
    let metrics_path = state.cfg().metrics.path.clone();

    Router::new()
        .route("/", get(routes::root))
        .route(&metrics_path, get(routes::metrics::exposition))
        .route("/metrics/summary", get(routes::metrics::summary))
        .route("/metrics/health-score", get(routes::metrics::health_score))
        .route("/metrics/alerts", get(routes::metrics::alerts))
        .route("/metrics/trends", get(routes::metrics::trends))
        .route("/metrics/export", get(routes::metrics::export))
        .route("/health", get(routes::health::health))
        .route("/health/detailed", get(routes::health::detailed))
        .route("/health/live", get(routes::health::live))
        .route("/health/ready", get(routes::health::ready))
        .route(
            "/api/v1/data",
            get(routes::data::list).post(routes::data::create),
        )
        .route("/api/v1/data/bulk", axum::routing::post(routes::data::create_bulk))
        .route("/api/v1/data/stats/summary", get(routes::data::stats))
        .route(
            "/api/v1/data/:id",
            get(routes::data::get)
                .put(routes::data::update)
                .delete(routes::data::delete),
        )
        .fallback(routes::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .with_state(state)
}
