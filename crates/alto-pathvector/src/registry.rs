//! Per-batch ANE naming.
//!
//! Links that have no global name are named `autolink_<n>` after the
//! (switch, next hop) transition they represent; aggregated AS segments
//! are named `autopath_<m>` after their AS-path string. Numbering starts
//! at 1 and increases by one per new key. A registry lives for exactly one
//! lookup call, so names from different calls are unrelated.

use alto_types::{EndpointId, PropertyBag};
use std::collections::{BTreeMap, HashMap};

const AUTOLINK_PREFIX: &str = "autolink_";
const AUTOPATH_PREFIX: &str = "autopath_";

/// Properties of every ANE seen in a batch, keyed by ANE name.
pub type AnePropertyMap = BTreeMap<String, PropertyBag>;

/// A name handed out by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assigned {
    pub name: String,
    /// True when this call allocated the name.
    pub is_new: bool,
}

/// Allocates synthesized ANE names, reusing them for repeated keys.
#[derive(Debug, Default)]
pub struct AneRegistry {
    links: HashMap<(String, EndpointId), String>,
    as_paths: HashMap<String, String>,
}

impl AneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the `autolink_<n>` name of the `dpid → next_hop` transition.
    pub fn link(&mut self, dpid: &str, next_hop: &EndpointId) -> Assigned {
        let key = (dpid.to_string(), next_hop.clone());
        if let Some(name) = self.links.get(&key) {
            return Assigned {
                name: name.clone(),
                is_new: false,
            };
        }
        let name = format!("{}{}", AUTOLINK_PREFIX, self.links.len() + 1);
        self.links.insert(key, name.clone());
        Assigned { name, is_new: true }
    }

    /// Returns the `autopath_<m>` name of an AS-path string.
    pub fn as_path(&mut self, as_path: &str) -> Assigned {
        if let Some(name) = self.as_paths.get(as_path) {
            return Assigned {
                name: name.clone(),
                is_new: false,
            };
        }
        let name = format!("{}{}", AUTOPATH_PREFIX, self.as_paths.len() + 1);
        self.as_paths.insert(as_path.to_string(), name.clone());
        Assigned { name, is_new: true }
    }

    /// Number of synthesized link names.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Number of synthesized AS-segment names.
    pub fn as_path_count(&self) -> usize {
        self.as_paths.len()
    }
}

/// Mutable state shared by all flows of one lookup call.
#[derive(Debug, Default)]
pub struct BatchState {
    pub registry: AneRegistry,
    pub properties: AnePropertyMap,
}

impl BatchState {
    pub fn new() -> Self {
        Self::default()
    }
}
