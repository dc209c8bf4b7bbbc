//! Topology snapshots and the sources they are loaded from.

use alto_types::{EndpointId, PropertyBag, SwitchActions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{BrokerError, Result};

/// One forwarding rule as written in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardingRuleSpec {
    /// `*`, an exact endpoint, or a `domain:prefix/len` IP prefix.
    pub destination: String,

    /// Restricts the rule to traffic arriving on this port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_port: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hop: Option<EndpointId>,

    #[serde(default)]
    pub actions: SwitchActions,
}

/// Everything the snapshot-backed brokers know about one namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    /// Endpoint properties keyed by endpoint.
    #[serde(default)]
    pub endpoints: BTreeMap<EndpointId, PropertyBag>,

    /// Forwarding rules keyed by switch identity, in priority order.
    #[serde(default)]
    pub forwarding: BTreeMap<String, Vec<ForwardingRuleSpec>>,

    /// `(lat, lng)` per local id, keyed by data source.
    #[serde(default)]
    pub geo: BTreeMap<String, BTreeMap<String, (f64, f64)>>,
}

impl TopologySnapshot {
    /// Decodes a snapshot, choosing JSON or YAML by file extension.
    pub fn decode(path: &Path, text: &str) -> Result<Self> {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let decoded = if is_json {
            serde_json::from_str(text).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(text).map_err(|e| e.to_string())
        };

        decoded.map_err(|message| BrokerError::Decode {
            path: path.to_path_buf(),
            message,
        })
    }
}

/// Where a broker gets fresh snapshots from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Loads the current snapshot.
    async fn load(&self) -> Result<TopologySnapshot>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// Loads snapshots from a YAML or JSON file on every rebuild.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn load(&self) -> Result<TopologySnapshot> {
        debug!(path = %self.path.display(), "Reading topology snapshot");
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| BrokerError::Source {
                path: self.path.clone(),
                source,
            })?;
        TopologySnapshot::decode(&self.path, &text)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Serves a fixed in-memory snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshotSource {
    snapshot: TopologySnapshot,
}

impl StaticSnapshotSource {
    pub fn new(snapshot: TopologySnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl SnapshotSource for StaticSnapshotSource {
    async fn load(&self) -> Result<TopologySnapshot> {
        Ok(self.snapshot.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}
