//! Shared error type across vitals crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Unified error type used by the engine and the server.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A metric name was registered twice with a different kind or schema.
    /// Fatal at startup, never raised at runtime.
    #[error("duplicate metric: {0}")]
    DuplicateMetric(String),
    /// A counter was asked to decrease, or a label tuple did not match the
    /// descriptor. Caller bug; logged and dropped on the request path.
    #[error("invalid delta: {0}")]
    InvalidDelta(String),
    /// A descriptor failed validation at registration time.
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
    /// OS-level stat collection failed for one tick.
    #[error("sampling failed: {0}")]
    Sampling(String),
    /// A series could not be rendered into the text format.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// Configuration could not be parsed or validated.
    #[error("config error: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MetricsError {
    /// Map to a stable HTTP status for the rare surfaces that expose errors.
    pub fn status(&self) -> u16 {
        match self {
            MetricsError::Config(_) | MetricsError::InvalidDescriptor(_) => 400,
            MetricsError::DuplicateMetric(_)
            | MetricsError::InvalidDelta(_)
            | MetricsError::Sampling(_)
            | MetricsError::Serialization(_)
            | MetricsError::Internal(_) => 500,
        }
    }
}
