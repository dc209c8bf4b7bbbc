//! Data brokers for the ALTO path-vector backend.
//!
//! The services never read topology data directly; they go through the
//! broker contracts defined here:
//!
//! - [`EndpointBroker`]: endpoint → properties (`dpid`, `in_port`, `is_local`, ...)
//! - [`ForwardingBroker`]: (switch, destination, in_port) → [`SwitchAction`](alto_types::SwitchAction)
//! - [`GeoDelegateBroker`]: (data source, local ids) → locations
//!
//! Snapshot-backed implementations ([`CachedEndpointBroker`],
//! [`CachedForwardingBroker`], [`CachedGeoBroker`]) load a
//! [`TopologySnapshot`] from a [`SnapshotSource`] on `build_cache()`.
//! A [`BrokerContext`] holds the brokers of each namespace and is passed
//! explicitly to the services.

mod broker;
mod cached;
mod context;
mod error;
mod fib;
mod snapshot;

pub use broker::{BrokerKind, EndpointBroker, ForwardingBroker, GeoDelegateBroker, GeoLocation};
pub use cached::{CachedEndpointBroker, CachedForwardingBroker, CachedGeoBroker, DEFAULT_GEO_SOURCE};
pub use context::{BrokerContext, NamespaceBrokers};
pub use error::{BrokerError, Result};
pub use fib::{ForwardingTable, RouteMatch};
pub use snapshot::{
    FileSnapshotSource, ForwardingRuleSpec, SnapshotSource, StaticSnapshotSource, TopologySnapshot,
};
