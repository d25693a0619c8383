//! vitals server library entry.
//!
//! This crate wires the metrics engine into an axum service: config loading,
//! shared application state, the request-instrumentation middleware, the
//! system sampler background task, and the metrics / health / data routes.
//! It is consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod http;
pub mod router;
pub mod routes;
pub mod sampler;
