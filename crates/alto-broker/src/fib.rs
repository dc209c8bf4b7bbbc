//! Compiled forwarding tables.
//!
//! Rules are matched per switch. A rule bound to the query's ingress port
//! beats a wildcard-port rule; after that an exact destination beats the
//! longest matching prefix, which beats the default route. Ties go to the
//! rule listed first.

use alto_types::{EndpointId, IpPrefix, SwitchAction};
use std::collections::HashMap;

use crate::snapshot::ForwardingRuleSpec;
use crate::{BrokerError, Result};

/// What destinations a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    /// Default route (`*`).
    Any,
    /// All endpoints of `domain` whose address falls in `prefix`.
    Prefix { domain: String, prefix: IpPrefix },
    /// Exactly one endpoint.
    Exact(EndpointId),
}

impl RouteMatch {
    /// Parses a rule destination. A `domain:local_id` destination is a
    /// prefix when the local id parses as one; a malformed prefix in an IP
    /// domain is rejected.
    pub fn parse(switch: &str, destination: &str) -> Result<Self> {
        let destination = destination.trim();
        if destination == "*" || destination == "default" {
            return Ok(RouteMatch::Any);
        }

        if let Some((domain, local_id)) = destination.split_once(':') {
            if local_id.contains('/') {
                match local_id.parse::<IpPrefix>() {
                    Ok(prefix) => {
                        return Ok(RouteMatch::Prefix {
                            domain: domain.to_string(),
                            prefix,
                        })
                    }
                    // Outside ipv4/ipv6 a slash is part of a plain identifier.
                    Err(e) if is_ip_domain(domain) => {
                        return Err(BrokerError::invalid_rule(switch, format!("{e}")))
                    }
                    Err(_) => {}
                }
            }
        }

        Ok(RouteMatch::Exact(EndpointId::new(destination)))
    }

    /// Returns the match specificity for `destination`, or `None` if the
    /// rule does not apply.
    fn specificity(&self, destination: &EndpointId) -> Option<u16> {
        match self {
            RouteMatch::Any => Some(0),
            RouteMatch::Prefix { domain, prefix } => {
                if destination.domain() != Some(domain.as_str()) {
                    return None;
                }
                let addr = destination.ip_address()?;
                prefix
                    .contains(&addr)
                    .then_some(1 + prefix.prefix_len() as u16)
            }
            RouteMatch::Exact(ep) => (ep == destination).then_some(u16::MAX),
        }
    }
}

fn is_ip_domain(domain: &str) -> bool {
    matches!(domain, "ipv4" | "ipv6")
}

#[derive(Debug, Clone)]
struct CompiledRule {
    destination: RouteMatch,
    in_port: Option<String>,
    action: SwitchAction,
}

/// Forwarding rules of every switch, ready for lookups.
#[derive(Debug, Clone, Default)]
pub struct ForwardingTable {
    switches: HashMap<String, Vec<CompiledRule>>,
}

impl ForwardingTable {
    /// Compiles snapshot rules, rejecting unparseable destinations.
    pub fn compile<'a, I>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a Vec<ForwardingRuleSpec>)>,
    {
        let mut switches = HashMap::new();
        for (dpid, specs) in rules {
            let compiled = specs
                .iter()
                .map(|spec| {
                    Ok(CompiledRule {
                        destination: RouteMatch::parse(dpid, &spec.destination)?,
                        in_port: spec.in_port.clone(),
                        action: SwitchAction {
                            next_hop: spec.next_hop.clone(),
                            actions: spec.actions.clone(),
                        },
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            switches.insert(dpid.clone(), compiled);
        }
        Ok(Self { switches })
    }

    /// Number of switches with at least one rule.
    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }

    /// Total number of rules.
    pub fn rule_count(&self) -> usize {
        self.switches.values().map(Vec::len).sum()
    }

    /// Finds the best rule; unknown switches and misses are terminal.
    pub fn lookup(&self, dpid: &str, destination: &EndpointId, in_port: &str) -> SwitchAction {
        let Some(rules) = self.switches.get(dpid) else {
            return SwitchAction::terminal();
        };

        let mut best: Option<((bool, u16), &CompiledRule)> = None;
        for rule in rules {
            let port_bound = match &rule.in_port {
                Some(port) if port == in_port => true,
                Some(_) => continue,
                None => false,
            };
            let Some(specificity) = rule.destination.specificity(destination) else {
                continue;
            };
            let score = (port_bound, specificity);
            if best.as_ref().map_or(true, |(top, _)| score > *top) {
                best = Some((score, rule));
            }
        }

        best.map(|(_, rule)| rule.action.clone())
            .unwrap_or_else(SwitchAction::terminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn rule(destination: &str, in_port: Option<&str>, next_hop: Option<&str>) -> ForwardingRuleSpec {
        ForwardingRuleSpec {
            destination: destination.to_string(),
            in_port: in_port.map(str::to_string),
            next_hop: next_hop.map(EndpointId::new),
            actions: Default::default(),
        }
    }

    fn table(rules: Vec<ForwardingRuleSpec>) -> ForwardingTable {
        let mut map = BTreeMap::new();
        map.insert("sw1".to_string(), rules);
        ForwardingTable::compile(&map).unwrap()
    }

    #[test]
    fn test_route_match_parse() {
        assert_eq!(RouteMatch::parse("sw1", "*").unwrap(), RouteMatch::Any);
        assert_eq!(
            RouteMatch::parse("sw1", "ipv4:10.0.0.1").unwrap(),
            RouteMatch::Exact(EndpointId::new("ipv4:10.0.0.1"))
        );
        assert!(matches!(
            RouteMatch::parse("sw1", "ipv4:10.0.0.0/8").unwrap(),
            RouteMatch::Prefix { .. }
        ));
        assert!(RouteMatch::parse("sw1", "ipv4:10.0.0.0/40").is_err());
        assert!(RouteMatch::parse("sw1", "ipv6:2001:db8::/129").is_err());
    }

    #[test]
    fn test_slash_in_non_ip_identifier_is_exact() {
        assert_eq!(
            RouteMatch::parse("sw1", "eth:port/1").unwrap(),
            RouteMatch::Exact(EndpointId::new("eth:port/1"))
        );
        assert_eq!(
            RouteMatch::parse("sw1", "10.0.0.0/8").unwrap(),
            RouteMatch::Exact(EndpointId::new("10.0.0.0/8"))
        );

        let fib = table(vec![
            rule("*", None, Some("ipv4:192.168.0.254")),
            rule("eth:port/1", None, Some("ipv4:192.168.1.1")),
        ]);
        let action = fib.lookup("sw1", &EndpointId::new("eth:port/1"), "0");
        assert_eq!(action.next_hop, Some(EndpointId::new("ipv4:192.168.1.1")));
    }

    #[test]
    fn test_longest_prefix_wins() {
        let fib = table(vec![
            rule("*", None, Some("ipv4:192.168.0.254")),
            rule("ipv4:10.0.0.0/8", None, Some("ipv4:192.168.1.1")),
            rule("ipv4:10.0.5.0/24", None, Some("ipv4:192.168.1.2")),
        ]);

        let action = fib.lookup("sw1", &EndpointId::new("ipv4:10.0.5.5"), "0");
        assert_eq!(action.next_hop, Some(EndpointId::new("ipv4:192.168.1.2")));

        let action = fib.lookup("sw1", &EndpointId::new("ipv4:10.9.0.1"), "0");
        assert_eq!(action.next_hop, Some(EndpointId::new("ipv4:192.168.1.1")));

        let action = fib.lookup("sw1", &EndpointId::new("ipv6:2001:db8::1"), "0");
        assert_eq!(action.next_hop, Some(EndpointId::new("ipv4:192.168.0.254")));
    }

    #[test]
    fn test_exact_beats_prefix() {
        let fib = table(vec![
            rule("ipv4:10.0.5.0/24", None, Some("ipv4:192.168.1.2")),
            rule("ipv4:10.0.5.5", None, None),
        ]);
        let action = fib.lookup("sw1", &EndpointId::new("ipv4:10.0.5.5"), "0");
        assert!(action.is_terminal());
    }

    #[test]
    fn test_port_bound_rule_preferred() {
        let fib = table(vec![
            rule("ipv4:10.0.5.5", None, Some("ipv4:192.168.1.2")),
            rule("*", Some("3"), Some("ipv4:192.168.1.3")),
        ]);

        let action = fib.lookup("sw1", &EndpointId::new("ipv4:10.0.5.5"), "3");
        assert_eq!(action.next_hop, Some(EndpointId::new("ipv4:192.168.1.3")));

        let action = fib.lookup("sw1", &EndpointId::new("ipv4:10.0.5.5"), "1");
        assert_eq!(action.next_hop, Some(EndpointId::new("ipv4:192.168.1.2")));
    }

    #[test]
    fn test_first_rule_wins_ties() {
        let fib = table(vec![
            rule("*", None, Some("ipv4:192.168.1.1")),
            rule("*", None, Some("ipv4:192.168.1.9")),
        ]);
        let action = fib.lookup("sw1", &EndpointId::new("ipv4:10.0.5.5"), "0");
        assert_eq!(action.next_hop, Some(EndpointId::new("ipv4:192.168.1.1")));
    }

    #[test]
    fn test_unknown_switch_or_miss_is_terminal() {
        let fib = table(vec![rule("ipv4:10.0.5.0/24", None, Some("ipv4:192.168.1.2"))]);
        assert!(fib
            .lookup("sw9", &EndpointId::new("ipv4:10.0.5.5"), "0")
            .is_terminal());
        assert!(fib
            .lookup("sw1", &EndpointId::new("ipv4:172.16.0.1"), "0")
            .is_terminal());
        assert_eq!(fib.switch_count(), 1);
        assert_eq!(fib.rule_count(), 1);
    }
}
