//! Forwarding actions and property bags.

use crate::EndpointId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named properties of an endpoint or an abstract network element.
///
/// Values are JSON values so that nested properties (e.g. the per-link
/// bags under `incoming_links`) round-trip unchanged to the ALTO response.
pub type PropertyBag = BTreeMap<String, serde_json::Value>;

/// Well-known property names.
pub mod props {
    /// Switch (datapath) identity of an endpoint.
    pub const DPID: &str = "dpid";
    /// Port on which traffic from the endpoint enters its switch.
    pub const IN_PORT: &str = "in_port";
    /// Whether the endpoint belongs to the local network.
    pub const IS_LOCAL: &str = "is_local";
    /// Map from link name to that link's property bag.
    pub const INCOMING_LINKS: &str = "incoming_links";
    /// Next hop reached through an ANE.
    pub const NEXT_HOP: &str = "next_hop";
    /// Space-separated AS numbers of an aggregated segment.
    pub const AS_PATH: &str = "as_path";
    /// `{lat, lng}` location of an entity.
    pub const GEOLOCATION: &str = "geolocation";
}

/// Attributes attached to a forwarding decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchActions {
    /// Globally named link the packet leaves on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_link: Option<String>,

    /// AS numbers towards the destination; the last entry is the origin AS.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub as_path: Vec<String>,

    /// Any other attributes the forwarding source reports.
    #[serde(flatten)]
    pub extra: PropertyBag,
}

/// Result of a forwarding lookup on one switch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchAction {
    /// `None` marks the final hop inside the network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hop: Option<EndpointId>,

    #[serde(default)]
    pub actions: SwitchActions,
}

impl SwitchAction {
    /// A terminal action: no next hop and no attributes.
    pub fn terminal() -> Self {
        Self::default()
    }

    /// An action forwarding to `next_hop`.
    pub fn forward(next_hop: impl Into<EndpointId>) -> Self {
        Self {
            next_hop: Some(next_hop.into()),
            actions: SwitchActions::default(),
        }
    }

    pub fn with_outgoing_link(mut self, link: impl Into<String>) -> Self {
        self.actions.outgoing_link = Some(link.into());
        self
    }

    pub fn with_as_path<I, S>(mut self, as_path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions.as_path = as_path.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.next_hop.is_none()
    }

    /// Joins the AS path without its origin AS (the last element).
    ///
    /// Returns `None` when nothing remains after dropping the origin.
    pub fn transit_as_path(&self) -> Option<String> {
        let (_, transit) = self.actions.as_path.split_last()?;
        if transit.is_empty() {
            None
        } else {
            Some(transit.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transit_as_path_drops_origin() {
        let action = SwitchAction::terminal().with_as_path(["64500", "64501", "64999"]);
        assert_eq!(action.transit_as_path(), Some("64500 64501".to_string()));
    }

    #[test]
    fn test_transit_as_path_empty_cases() {
        assert_eq!(SwitchAction::terminal().transit_as_path(), None);

        let origin_only = SwitchAction::terminal().with_as_path(["64999"]);
        assert_eq!(origin_only.transit_as_path(), None);
    }

    #[test]
    fn test_action_deserialize_keeps_extra_attributes() {
        let action: SwitchAction = serde_json::from_value(serde_json::json!({
            "next_hop": "ipv4:192.168.1.2",
            "actions": {
                "outgoing_link": "L1",
                "as_path": ["64500", "64999"],
                "vlan": 100
            }
        }))
        .unwrap();

        assert_eq!(action.next_hop, Some(EndpointId::new("ipv4:192.168.1.2")));
        assert_eq!(action.actions.outgoing_link.as_deref(), Some("L1"));
        assert_eq!(action.actions.as_path, vec!["64500", "64999"]);
        assert_eq!(action.actions.extra.get("vlan"), Some(&serde_json::json!(100)));
    }
}
