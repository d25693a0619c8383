//! vitals core: metric registry, derived analytics, and text exposition.
//!
//! This crate holds the in-process observability engine shared by the server
//! and by tooling: the registered metric families, their concurrent series
//! cells, the analytics layer that derives rates / percentiles / health
//! signals from registry snapshots, and the Prometheus text renderer. It
//! intentionally carries no HTTP or runtime dependencies so it can be embedded
//! and tested in isolation.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Every fallible path surfaces as `MetricsError`/`Result`; failures on the
//! request hot path degrade observability, never availability.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod analytics;
pub mod error;
pub mod expose;
pub mod metric;
pub mod names;

/// Shared result type.
pub use error::{MetricsError, Result};
pub use metric::{MetricDescriptor, MetricHandle, MetricKind, Registry, RegistrySnapshot};
