//! Common ALTO types for the path-vector backend.
//!
//! This crate provides the value types shared by the data brokers, the
//! path-vector services and the northbound renderer:
//!
//! - [`EndpointId`]: `domain:identifier` endpoint names (e.g. `ipv4:10.0.0.1`)
//! - [`Flow`]: an (ingress, source, destination) triple
//! - [`SwitchAction`]: the result of a forwarding lookup
//! - [`PropertyBag`]: a named property map attached to endpoints and ANEs
//! - [`IpPrefix`]: CIDR parsing and prefix containment

mod action;
mod endpoint;
mod ip;

pub use action::{props, PropertyBag, SwitchAction, SwitchActions};
pub use endpoint::{EndpointId, Flow};
pub use ip::IpPrefix;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid IP prefix format: {0}")]
    InvalidIpPrefix(String),

    #[error("invalid endpoint identifier: {0} (expected domain:identifier)")]
    InvalidEndpoint(String),

    #[error("invalid flow: {0} (expected SRC,DST or INGRESS,SRC,DST)")]
    InvalidFlow(String),
}
