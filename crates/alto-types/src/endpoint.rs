//! Endpoint identifiers and flows.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// An endpoint identifier of the form `domain:identifier`.
///
/// The identifier is opaque to the path-vector engine; only the GeoIP
/// lookup and the forwarding prefix match look inside it. Next hops that
/// are switch-local ids (no domain) are also carried as `EndpointId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(String);

impl EndpointId {
    /// Creates an endpoint identifier without validating its shape.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the identifier at the first `:` into `(domain, local_id)`.
    pub fn split_domain(&self) -> Option<(&str, &str)> {
        self.0.split_once(':')
    }

    /// Returns the routing domain (`ipv4` in `ipv4:10.0.0.1`).
    pub fn domain(&self) -> Option<&str> {
        self.split_domain().map(|(domain, _)| domain)
    }

    /// Returns the local identifier (`10.0.0.1` in `ipv4:10.0.0.1`).
    pub fn local_id(&self) -> Option<&str> {
        self.split_domain().map(|(_, local)| local)
    }

    /// Interprets the local identifier as an IP address, if it is one.
    pub fn ip_address(&self) -> Option<IpAddr> {
        self.local_id()?.parse().ok()
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EndpointId {
    type Err = ParseError;

    /// Parses a `domain:identifier` string; both halves must be non-empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once(':') {
            Some((domain, local)) if !domain.is_empty() && !local.is_empty() => {
                Ok(Self(s.trim().to_string()))
            }
            _ => Err(ParseError::InvalidEndpoint(s.to_string())),
        }
    }
}

impl From<&str> for EndpointId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EndpointId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for EndpointId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A traffic flow: where it enters the network, who sends it, where it goes.
///
/// For flows that originate at an attached host the ingress point is the
/// source itself; [`Flow::new`] builds that common case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flow {
    pub ingress: EndpointId,
    pub source: EndpointId,
    pub destination: EndpointId,
}

impl Flow {
    /// Creates a flow whose ingress point is its source endpoint.
    pub fn new(source: impl Into<EndpointId>, destination: impl Into<EndpointId>) -> Self {
        let source = source.into();
        Self {
            ingress: source.clone(),
            source,
            destination: destination.into(),
        }
    }

    /// Creates a flow entering the network at an explicit ingress point.
    pub fn with_ingress(
        ingress: impl Into<EndpointId>,
        source: impl Into<EndpointId>,
        destination: impl Into<EndpointId>,
    ) -> Self {
        Self {
            ingress: ingress.into(),
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Decomposes the flow into `(ingress, source, destination)`.
    pub fn parts(&self) -> (&EndpointId, &EndpointId, &EndpointId) {
        (&self.ingress, &self.source, &self.destination)
    }
}

impl FromStr for Flow {
    type Err = ParseError;

    /// Parses `SRC,DST` or `INGRESS,SRC,DST`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        let parse = |f: &str| {
            f.parse::<EndpointId>()
                .map_err(|_| ParseError::InvalidFlow(s.to_string()))
        };
        match fields.as_slice() {
            [src, dst] => Ok(Flow::new(parse(src)?, parse(dst)?)),
            [ingress, src, dst] => Ok(Flow::with_ingress(
                parse(ingress)?,
                parse(src)?,
                parse(dst)?,
            )),
            _ => Err(ParseError::InvalidFlow(s.to_string())),
        }
    }
}
