//! Explicit per-namespace broker registry.
//!
//! A `BrokerContext` is built once at startup and handed to every service
//! constructor. Namespaces are isolated: each holds its own broker
//! instances and nothing is shared through globals.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::broker::{EndpointBroker, ForwardingBroker, GeoDelegateBroker};
use crate::cached::{CachedEndpointBroker, CachedForwardingBroker, CachedGeoBroker};
use crate::snapshot::SnapshotSource;
use crate::{BrokerError, BrokerKind, Result};

/// The brokers serving one namespace.
#[derive(Clone, Default)]
pub struct NamespaceBrokers {
    pub endpoint: Option<Arc<dyn EndpointBroker>>,
    pub forwarding: Option<Arc<dyn ForwardingBroker>>,
    pub geo: Option<Arc<dyn GeoDelegateBroker>>,
}

impl NamespaceBrokers {
    /// Creates all three snapshot-backed brokers over one source.
    pub fn from_snapshot_source(source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            endpoint: Some(Arc::new(CachedEndpointBroker::new(source.clone()))),
            forwarding: Some(Arc::new(CachedForwardingBroker::new(source.clone()))),
            geo: Some(Arc::new(CachedGeoBroker::new(source))),
        }
    }

    pub fn with_endpoint(mut self, broker: Arc<dyn EndpointBroker>) -> Self {
        self.endpoint = Some(broker);
        self
    }

    pub fn with_forwarding(mut self, broker: Arc<dyn ForwardingBroker>) -> Self {
        self.forwarding = Some(broker);
        self
    }

    pub fn with_geo(mut self, broker: Arc<dyn GeoDelegateBroker>) -> Self {
        self.geo = Some(broker);
        self
    }
}

/// Brokers for every configured namespace.
#[derive(Clone, Default)]
pub struct BrokerContext {
    namespaces: BTreeMap<String, NamespaceBrokers>,
}

impl BrokerContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the brokers of a namespace.
    pub fn register(&mut self, namespace: impl Into<String>, brokers: NamespaceBrokers) {
        self.namespaces.insert(namespace.into(), brokers);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_namespace(mut self, namespace: impl Into<String>, brokers: NamespaceBrokers) -> Self {
        self.register(namespace, brokers);
        self
    }

    /// Returns the registered namespace names.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    fn brokers(&self, namespace: &str) -> Result<&NamespaceBrokers> {
        self.namespaces
            .get(namespace)
            .ok_or_else(|| BrokerError::UnknownNamespace(namespace.to_string()))
    }

    fn missing(namespace: &str, kind: BrokerKind) -> BrokerError {
        BrokerError::MissingBroker {
            namespace: namespace.to_string(),
            kind,
        }
    }

    pub fn endpoint(&self, namespace: &str) -> Result<Arc<dyn EndpointBroker>> {
        self.brokers(namespace)?
            .endpoint
            .clone()
            .ok_or_else(|| Self::missing(namespace, BrokerKind::Endpoint))
    }

    pub fn forwarding(&self, namespace: &str) -> Result<Arc<dyn ForwardingBroker>> {
        self.brokers(namespace)?
            .forwarding
            .clone()
            .ok_or_else(|| Self::missing(namespace, BrokerKind::Forwarding))
    }

    pub fn geo(&self, namespace: &str) -> Result<Arc<dyn GeoDelegateBroker>> {
        self.brokers(namespace)?
            .geo
            .clone()
            .ok_or_else(|| Self::missing(namespace, BrokerKind::Delegate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::StaticSnapshotSource;

    fn context() -> BrokerContext {
        let source: Arc<dyn SnapshotSource> = Arc::new(StaticSnapshotSource::default());
        BrokerContext::new()
            .with_namespace("default", NamespaceBrokers::from_snapshot_source(source.clone()))
            .with_namespace(
                "edge",
                NamespaceBrokers::default()
                    .with_endpoint(Arc::new(CachedEndpointBroker::new(source))),
            )
    }

    #[test]
    fn test_namespace_lookup() {
        let ctx = context();
        assert!(ctx.contains("default"));
        assert_eq!(ctx.namespaces().collect::<Vec<_>>(), vec!["default", "edge"]);
        assert!(ctx.endpoint("default").is_ok());
        assert!(ctx.forwarding("default").is_ok());
        assert!(ctx.geo("default").is_ok());
    }

    #[test]
    fn test_unknown_namespace() {
        let err = context().endpoint("lab").err().unwrap();
        assert!(matches!(err, BrokerError::UnknownNamespace(ns) if ns == "lab"));
    }

    #[test]
    fn test_missing_broker_kind() {
        let ctx = context();
        assert!(ctx.endpoint("edge").is_ok());
        let err = ctx.forwarding("edge").err().unwrap();
        assert!(matches!(
            err,
            BrokerError::MissingBroker { kind: BrokerKind::Forwarding, .. }
        ));
    }
}
