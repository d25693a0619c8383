//! vitals server binary.
//!
//! Wiring order matters: state (and with it every metric family) is built
//! before the listener binds, and the sampler's shutdown is requested before
//! the process exits so no tick is interrupted mid-sample.

use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use vitals_server::{app_state::AppState, config, router, sampler::SystemSampler};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "vitals.yaml".to_string());
    let cfg = config::load_from_file(&config_path).expect("config load failed");
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .expect("server.listen must be a valid SocketAddr");

    let state = AppState::new(cfg).expect("app state build failed");

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    if state.cfg().sampler.enable_system_metrics {
        let interval = Duration::from_secs(state.cfg().sampler.collection_interval_seconds);
        let sampler = SystemSampler::new(state.clone()).expect("sampler init failed");
        sampler.spawn(interval, shutdown_rx);
        tracing::info!(interval_seconds = interval.as_secs(), "system metrics collection started");
    }

    let app = router::build_router(state);

    tracing::info!(%listen, "vitals-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            let _ = shutdown_tx.send(true);
            tracing::info!("shutdown requested");
        })
        .await
        .expect("server failed");
}
