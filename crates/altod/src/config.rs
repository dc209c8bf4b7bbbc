//! Daemon configuration.
//!
//! ```yaml
//! namespaces:
//!   default:
//!     topology: default-topology.yaml
//!     autoreload: true
//!     geo_data_source: geolite
//! ```
//!
//! Every namespace gets its own snapshot-backed brokers; relative topology
//! paths are resolved against the directory of the configuration file.

use alto_broker::{BrokerContext, FileSnapshotSource, NamespaceBrokers};
use alto_pathvector::ServiceConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("No namespaces configured")]
    NoNamespaces,

    #[error("Namespace {0}: topology path is empty")]
    EmptyTopology(String),

    #[error("Namespace {0} is not configured")]
    UnknownNamespace(String),
}

/// One namespace: where its topology lives and how its services behave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Topology snapshot file (YAML or JSON).
    pub topology: PathBuf,

    #[serde(flatten)]
    pub service: ServiceConfig,
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AltoConfig {
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceConfig>,
}

impl AltoConfig {
    /// Loads and validates a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: AltoConfig =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        config.validate()?;

        debug!(path = %path.display(), namespaces = config.namespaces.len(), "Loaded configuration");
        Ok(config)
    }

    /// Checks that at least one namespace exists and every namespace
    /// names a topology file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespaces.is_empty() {
            return Err(ConfigError::NoNamespaces);
        }
        for (name, ns) in &self.namespaces {
            if ns.topology.as_os_str().is_empty() {
                return Err(ConfigError::EmptyTopology(name.clone()));
            }
        }
        Ok(())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for ns in self.namespaces.values_mut() {
            if ns.topology.is_relative() && !ns.topology.as_os_str().is_empty() {
                ns.topology = base.join(&ns.topology);
            }
        }
    }

    pub fn namespace(&self, name: &str) -> Result<&NamespaceConfig, ConfigError> {
        self.namespaces
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNamespace(name.to_string()))
    }

    /// Builds the broker context: one file-backed set of brokers per
    /// namespace.
    pub fn build_context(&self) -> BrokerContext {
        let mut ctx = BrokerContext::new();
        for (name, ns) in &self.namespaces {
            let source = Arc::new(FileSnapshotSource::new(&ns.topology));
            ctx.register(name.clone(), NamespaceBrokers::from_snapshot_source(source));
            info!(namespace = %name, topology = %ns.topology.display(), "Registered brokers");
        }
        ctx
    }
}
