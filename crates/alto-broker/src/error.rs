//! Error types for broker operations.
//!
//! Only conditions that make a broker unable to answer are errors. An
//! unknown endpoint or switch is a normal `None`/terminal answer.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::BrokerKind;

/// Result type alias for broker operations.
pub type Result<T> = std::result::Result<T, BrokerError>;

/// Errors that can occur while building or querying a broker.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The backing data source cannot be reached, or no cache is loaded.
    #[error("{broker} broker unavailable: {message}")]
    Unavailable {
        /// Which broker failed (e.g. "endpoint", "forwarding").
        broker: String,
        /// Error message.
        message: String,
    },

    /// Reading the snapshot failed.
    #[error("Failed to read topology snapshot '{}': {source}", path.display())]
    Source {
        /// The snapshot path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The snapshot could not be decoded.
    #[error("Failed to decode topology snapshot '{}': {message}", path.display())]
    Decode {
        /// The snapshot path.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// A forwarding rule could not be compiled.
    #[error("Invalid forwarding rule on switch '{switch}': {message}")]
    InvalidRule {
        /// The switch the rule belongs to.
        switch: String,
        /// Error message.
        message: String,
    },

    /// No brokers are registered for the namespace.
    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    /// The namespace exists but has no broker of the requested kind.
    #[error("Namespace '{namespace}' has no {kind} broker")]
    MissingBroker {
        /// The namespace.
        namespace: String,
        /// The broker kind that is missing.
        kind: BrokerKind,
    },
}

impl BrokerError {
    /// Creates an unavailable-broker error.
    pub fn unavailable(broker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            broker: broker.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid forwarding rule error.
    pub fn invalid_rule(switch: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRule {
            switch: switch.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BrokerError::Unavailable { .. } | BrokerError::Source { .. })
    }
}
