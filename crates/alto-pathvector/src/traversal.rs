//! Next-hop traversal.
//!
//! Walks a flow hop by hop through the forwarding brokers, starting at its
//! ingress point, and records one ANE per transition. The walk is an
//! explicit loop: its depth is bounded by the number of distinct ANEs, not
//! by the stack.
//!
//! The walk stops when
//! - the current hop has no resolvable switch identity (no action),
//! - the forwarding action has no next hop (last hop), or
//! - the ANE of the current transition is already on the path (loop).

use alto_broker::{EndpointBroker, ForwardingBroker};
use alto_types::{props, EndpointId, PropertyBag, SwitchAction};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, trace};

use crate::registry::BatchState;
use crate::value::as_identifier;
use crate::Result;

/// Ingress port assumed when an endpoint reports none.
pub const DEFAULT_IN_PORT: &str = "0";

/// Outcome of walking one flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    /// The last forwarding action taken, `None` if the walk never reached
    /// a switch.
    pub last_action: Option<SwitchAction>,
    /// ANE names in traversal order, without duplicates.
    pub path: Vec<String>,
}

/// Walks flows through the brokers of one namespace.
pub struct NextHopWalker<'a> {
    endpoints: &'a dyn EndpointBroker,
    forwarding: &'a dyn ForwardingBroker,
}

impl<'a> NextHopWalker<'a> {
    pub fn new(endpoints: &'a dyn EndpointBroker, forwarding: &'a dyn ForwardingBroker) -> Self {
        Self {
            endpoints,
            forwarding,
        }
    }

    /// Walks from `ingress` towards `destination`.
    ///
    /// ANE names and properties are recorded in `batch`, which is shared
    /// by all flows of the call.
    pub async fn walk(
        &self,
        ingress: &EndpointId,
        destination: &EndpointId,
        batch: &mut BatchState,
    ) -> Result<Traversal> {
        let mut path = Vec::new();
        let mut on_path = HashSet::new();
        let mut hop = ingress.clone();

        loop {
            let hop_props = self
                .endpoints
                .lookup(&hop, Some(&[props::DPID, props::IN_PORT][..]))
                .await?
                .unwrap_or_default();

            let Some(dpid) = as_identifier(hop_props.get(props::DPID)) else {
                trace!(%hop, "No switch identity, ending walk");
                return Ok(Traversal {
                    last_action: None,
                    path,
                });
            };
            let in_port = as_identifier(hop_props.get(props::IN_PORT))
                .unwrap_or_else(|| DEFAULT_IN_PORT.to_string());

            let action = self.forwarding.lookup(&dpid, destination, &in_port).await?;
            let Some(next_hop) = action.next_hop.clone() else {
                trace!(%hop, %dpid, "Last hop");
                return Ok(Traversal {
                    last_action: Some(action),
                    path,
                });
            };

            let ane = match action.actions.outgoing_link.as_deref() {
                Some(link) if !link.is_empty() => {
                    self.named_link(link, &next_hop, batch).await?;
                    link.to_string()
                }
                _ => {
                    let assigned = batch.registry.link(&dpid, &next_hop);
                    batch.properties.entry(assigned.name.clone()).or_default();
                    assigned.name
                }
            };

            if let Some(bag) = batch.properties.get_mut(&ane) {
                bag.insert(
                    props::NEXT_HOP.to_string(),
                    Value::String(next_hop.to_string()),
                );
            }

            if !on_path.insert(ane.clone()) {
                debug!(%ingress, %destination, %ane, "Forwarding loop detected");
                return Ok(Traversal {
                    last_action: Some(action),
                    path,
                });
            }
            trace!(%dpid, %in_port, %ane, %next_hop, "Hop");
            path.push(ane);
            hop = next_hop;
        }
    }

    /// Seeds the property bag of a named link the first time it is seen,
    /// from the `incoming_links` entry the next hop reports for it.
    async fn named_link(
        &self,
        link: &str,
        next_hop: &EndpointId,
        batch: &mut BatchState,
    ) -> Result<()> {
        if batch.properties.contains_key(link) {
            return Ok(());
        }

        let next_hop_props = self
            .endpoints
            .lookup(next_hop, Some(&[props::INCOMING_LINKS][..]))
            .await?
            .unwrap_or_default();

        let bag: PropertyBag = match next_hop_props
            .get(props::INCOMING_LINKS)
            .and_then(|links| links.get(link))
        {
            Some(Value::Object(entry)) => entry
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            _ => PropertyBag::new(),
        };
        batch.properties.insert(link.to_string(), bag);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alto_broker::{
        CachedEndpointBroker, CachedForwardingBroker, StaticSnapshotSource, TopologySnapshot,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Arc;

    async fn brokers(yaml: &str) -> (CachedEndpointBroker, CachedForwardingBroker) {
        let snapshot = TopologySnapshot::decode(Path::new("test.yaml"), yaml).unwrap();
        let source = Arc::new(StaticSnapshotSource::new(snapshot));
        let endpoints = CachedEndpointBroker::new(source.clone());
        let forwarding = CachedForwardingBroker::new(source);
        endpoints.build_cache().await.unwrap();
        forwarding.build_cache().await.unwrap();
        (endpoints, forwarding)
    }

    const CHAIN: &str = r#"
endpoints:
  "ipv4:10.0.0.1": { dpid: "sw1", in_port: "1", is_local: true }
  "ipv4:192.168.1.2": { dpid: "sw2", in_port: "2" }
  "ipv4:192.168.2.3": { dpid: "sw3", incoming_links: { "L23": { bandwidth: 100 } } }
forwarding:
  sw1:
    - { destination: "ipv4:10.0.5.5", next_hop: "ipv4:192.168.1.2" }
  sw2:
    - { destination: "ipv4:10.0.5.5", in_port: "2", next_hop: "ipv4:192.168.2.3", actions: { outgoing_link: "L23" } }
  sw3:
    - { destination: "ipv4:10.0.5.5", in_port: "0", actions: { as_path: ["64500", "64999"] } }
"#;

    #[tokio::test]
    async fn test_walk_mixes_synthesized_and_named_links() {
        let (endpoints, forwarding) = brokers(CHAIN).await;
        let walker = NextHopWalker::new(&endpoints, &forwarding);
        let mut batch = BatchState::new();

        let traversal = walker
            .walk(
                &EndpointId::new("ipv4:10.0.0.1"),
                &EndpointId::new("ipv4:10.0.5.5"),
                &mut batch,
            )
            .await
            .unwrap();

        assert_eq!(traversal.path, vec!["autolink_1", "L23"]);
        let last = traversal.last_action.unwrap();
        assert!(last.is_terminal());
        assert_eq!(last.actions.as_path, vec!["64500", "64999"]);

        assert_eq!(batch.properties["autolink_1"]["next_hop"], json!("ipv4:192.168.1.2"));
        assert_eq!(batch.properties["L23"]["bandwidth"], json!(100));
        assert_eq!(batch.properties["L23"]["next_hop"], json!("ipv4:192.168.2.3"));
    }

    #[tokio::test]
    async fn test_unknown_ingress_ends_without_action() {
        let (endpoints, forwarding) = brokers(CHAIN).await;
        let walker = NextHopWalker::new(&endpoints, &forwarding);
        let mut batch = BatchState::new();

        let traversal = walker
            .walk(
                &EndpointId::new("ipv4:10.9.9.9"),
                &EndpointId::new("ipv4:10.0.5.5"),
                &mut batch,
            )
            .await
            .unwrap();

        assert_eq!(traversal, Traversal { last_action: None, path: vec![] });
        assert!(batch.properties.is_empty());
    }

    #[tokio::test]
    async fn test_missing_in_port_defaults_to_zero() {
        // sw3's only rule is bound to port "0"; the endpoint reports no port.
        let (endpoints, forwarding) = brokers(CHAIN).await;
        let walker = NextHopWalker::new(&endpoints, &forwarding);
        let mut batch = BatchState::new();

        let traversal = walker
            .walk(
                &EndpointId::new("ipv4:192.168.2.3"),
                &EndpointId::new("ipv4:10.0.5.5"),
                &mut batch,
            )
            .await
            .unwrap();

        assert!(traversal.path.is_empty());
        assert_eq!(
            traversal.last_action.unwrap().actions.as_path,
            vec!["64500", "64999"]
        );
    }

    #[tokio::test]
    async fn test_loop_terminates() {
        let yaml = r#"
endpoints:
  "ipv4:10.0.0.1": { dpid: "swA" }
  "ipv4:10.0.0.2": { dpid: "swB" }
forwarding:
  swA:
    - { destination: "*", next_hop: "ipv4:10.0.0.2" }
  swB:
    - { destination: "*", next_hop: "ipv4:10.0.0.1" }
"#;
        let (endpoints, forwarding) = brokers(yaml).await;
        let walker = NextHopWalker::new(&endpoints, &forwarding);
        let mut batch = BatchState::new();

        let traversal = walker
            .walk(
                &EndpointId::new("ipv4:10.0.0.1"),
                &EndpointId::new("ipv4:172.16.0.1"),
                &mut batch,
            )
            .await
            .unwrap();

        assert_eq!(traversal.path, vec!["autolink_1", "autolink_2"]);
        // The action that closed the loop is swA -> 10.0.0.2 again.
        assert_eq!(
            traversal.last_action.unwrap().next_hop,
            Some(EndpointId::new("ipv4:10.0.0.2"))
        );
        assert_eq!(batch.registry.link_count(), 2);
    }

    #[tokio::test]
    async fn test_named_link_without_incoming_entry_gets_empty_bag() {
        let yaml = r#"
endpoints:
  "ipv4:10.0.0.1": { dpid: "sw1" }
forwarding:
  sw1:
    - { destination: "*", next_hop: "ipv4:10.0.0.99", actions: { outgoing_link: "uplink" } }
"#;
        let (endpoints, forwarding) = brokers(yaml).await;
        let walker = NextHopWalker::new(&endpoints, &forwarding);
        let mut batch = BatchState::new();

        let traversal = walker
            .walk(
                &EndpointId::new("ipv4:10.0.0.1"),
                &EndpointId::new("ipv4:10.0.5.5"),
                &mut batch,
            )
            .await
            .unwrap();

        assert_eq!(traversal.path, vec!["uplink"]);
        assert_eq!(batch.properties["uplink"].len(), 1);
        assert_eq!(batch.properties["uplink"]["next_hop"], json!("ipv4:10.0.0.99"));
        assert_eq!(batch.registry.link_count(), 0);
    }
}
