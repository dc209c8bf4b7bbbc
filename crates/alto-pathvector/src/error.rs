//! Error types for the ALTO services.
//!
//! Per-flow anomalies (unknown endpoints, remote sources, missing switch
//! identities, forwarding loops) are not errors. The only failure a
//! service reports is a broker that cannot answer, which aborts the whole
//! call.

use alto_broker::BrokerError;
use thiserror::Error;

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors returned by service lookups.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A broker failed to rebuild its cache or to answer a lookup.
    #[error("Broker error: {0}")]
    Broker(#[from] BrokerError),
}

impl ServiceError {
    /// Returns true if retrying the whole call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Broker(e) => e.is_retryable(),
        }
    }
}
