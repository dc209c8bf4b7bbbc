//! Broker contracts consumed by the ALTO services.
//!
//! A broker answers lookups from a cache of some backing data source
//! (a topology snapshot, a GeoIP database, ...). `build_cache()` refreshes
//! that cache; it is idempotent and safe to call before every batch.
//!
//! # Thread Safety
//!
//! Brokers are shared by concurrent service calls, so implementations must
//! be `Send + Sync` and must keep in-flight lookups consistent while a
//! rebuild is in progress. The services never lock a broker themselves.

use alto_types::{EndpointId, PropertyBag, SwitchAction};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::Result;

/// The kinds of broker a namespace can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrokerKind {
    /// Endpoint properties (dpid, in_port, is_local, incoming_links).
    Endpoint,
    /// Forwarding information base.
    Forwarding,
    /// Delegated lookups, e.g. GeoIP.
    Delegate,
}

impl BrokerKind {
    /// Returns the broker type name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            BrokerKind::Endpoint => "endpoint",
            BrokerKind::Forwarding => "forwarding",
            BrokerKind::Delegate => "delegate",
        }
    }
}

impl fmt::Display for BrokerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
}

impl From<(f64, f64)> for GeoLocation {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

/// Resolves endpoints to their properties.
#[async_trait]
pub trait EndpointBroker: Send + Sync {
    /// Rebuilds the endpoint cache from the backing source.
    async fn build_cache(&self) -> Result<()>;

    /// Looks up an endpoint.
    ///
    /// With `property_names` the returned bag holds only those properties;
    /// without, it holds all of them. Returns `Ok(None)` for an unknown
    /// endpoint.
    async fn lookup(
        &self,
        endpoint: &EndpointId,
        property_names: Option<&[&str]>,
    ) -> Result<Option<PropertyBag>>;
}

/// Resolves forwarding decisions.
#[async_trait]
pub trait ForwardingBroker: Send + Sync {
    /// Rebuilds the forwarding cache from the backing source.
    async fn build_cache(&self) -> Result<()>;

    /// Returns the action switch `dpid` applies to traffic for
    /// `destination` arriving on `in_port`.
    ///
    /// An action without a next hop marks the last hop.
    async fn lookup(&self, dpid: &str, destination: &EndpointId, in_port: &str)
        -> Result<SwitchAction>;
}

/// Resolves local identifiers through a delegated database.
#[async_trait]
pub trait GeoDelegateBroker: Send + Sync {
    /// Rebuilds the delegate cache from the backing source.
    async fn build_cache(&self) -> Result<()>;

    /// Looks up locations of `local_ids` in `data_source`.
    ///
    /// Unknown ids are left out of the returned map.
    async fn lookup(
        &self,
        data_source: Option<&str>,
        local_ids: &[String],
    ) -> Result<BTreeMap<String, GeoLocation>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_kind_names() {
        assert_eq!(BrokerKind::Endpoint.as_str(), "endpoint");
        assert_eq!(BrokerKind::Forwarding.as_str(), "forwarding");
        assert_eq!(BrokerKind::Delegate.to_string(), "delegate");
    }

    #[test]
    fn test_geolocation_from_tuple() {
        let loc = GeoLocation::from((37.77, -122.41));
        assert_eq!(loc.lat, 37.77);
        assert_eq!(loc.lng, -122.41);
    }
}
