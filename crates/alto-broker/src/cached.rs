//! Snapshot-backed brokers with atomic cache replacement.
//!
//! Each broker keeps its table behind `RwLock<Option<Arc<_>>>`. A rebuild
//! loads and compiles the new table without holding the lock, then swaps
//! the pointer under a short write lock. Lookups clone the `Arc` and read
//! an immutable table, so a concurrent rebuild never changes the data an
//! in-flight lookup sees. A failed rebuild leaves the previous table in
//! place.

use alto_types::{EndpointId, PropertyBag, SwitchAction};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, trace, warn};

use crate::broker::{EndpointBroker, ForwardingBroker, GeoDelegateBroker, GeoLocation};
use crate::fib::ForwardingTable;
use crate::snapshot::SnapshotSource;
use crate::{BrokerError, BrokerKind, Result};

/// Data source used when a geo lookup does not name one.
pub const DEFAULT_GEO_SOURCE: &str = "default";

/// A swappable, shared table.
struct SnapshotCache<T> {
    kind: BrokerKind,
    table: RwLock<Option<Arc<T>>>,
}

impl<T> SnapshotCache<T> {
    fn new(kind: BrokerKind) -> Self {
        Self {
            kind,
            table: RwLock::new(None),
        }
    }

    fn current(&self) -> Result<Arc<T>> {
        self.table
            .read()
            .clone()
            .ok_or_else(|| BrokerError::unavailable(self.kind.as_str(), "cache has not been built"))
    }

    fn replace(&self, table: T) {
        *self.table.write() = Some(Arc::new(table));
    }

    fn is_loaded(&self) -> bool {
        self.table.read().is_some()
    }
}

/// Endpoint broker answering from a topology snapshot.
pub struct CachedEndpointBroker {
    source: Arc<dyn SnapshotSource>,
    cache: SnapshotCache<HashMap<EndpointId, PropertyBag>>,
}

impl CachedEndpointBroker {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            source,
            cache: SnapshotCache::new(BrokerKind::Endpoint),
        }
    }

    /// Returns true once a cache has been built.
    pub fn is_loaded(&self) -> bool {
        self.cache.is_loaded()
    }
}

#[async_trait]
impl EndpointBroker for CachedEndpointBroker {
    async fn build_cache(&self) -> Result<()> {
        let snapshot = self.source.load().await.inspect_err(|e| {
            warn!(source = %self.source.describe(), error = %e, "Endpoint cache rebuild failed");
        })?;
        let table: HashMap<_, _> = snapshot.endpoints.into_iter().collect();
        info!(
            source = %self.source.describe(),
            endpoints = table.len(),
            "Rebuilt endpoint cache"
        );
        self.cache.replace(table);
        Ok(())
    }

    async fn lookup(
        &self,
        endpoint: &EndpointId,
        property_names: Option<&[&str]>,
    ) -> Result<Option<PropertyBag>> {
        let table = self.cache.current()?;
        let Some(props) = table.get(endpoint) else {
            trace!(%endpoint, "Unknown endpoint");
            return Ok(None);
        };

        let bag = match property_names {
            Some(names) => props
                .iter()
                .filter(|(name, _)| names.contains(&name.as_str()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            None => props.clone(),
        };
        Ok(Some(bag))
    }
}

/// Forwarding broker answering from compiled snapshot rules.
pub struct CachedForwardingBroker {
    source: Arc<dyn SnapshotSource>,
    cache: SnapshotCache<ForwardingTable>,
}

impl CachedForwardingBroker {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            source,
            cache: SnapshotCache::new(BrokerKind::Forwarding),
        }
    }

    /// Returns true once a cache has been built.
    pub fn is_loaded(&self) -> bool {
        self.cache.is_loaded()
    }
}

#[async_trait]
impl ForwardingBroker for CachedForwardingBroker {
    async fn build_cache(&self) -> Result<()> {
        let snapshot = self.source.load().await?;
        let table = ForwardingTable::compile(&snapshot.forwarding).inspect_err(|e| {
            warn!(source = %self.source.describe(), error = %e, "Forwarding cache rebuild failed");
        })?;
        info!(
            source = %self.source.describe(),
            switches = table.switch_count(),
            rules = table.rule_count(),
            "Rebuilt forwarding cache"
        );
        self.cache.replace(table);
        Ok(())
    }

    async fn lookup(
        &self,
        dpid: &str,
        destination: &EndpointId,
        in_port: &str,
    ) -> Result<SwitchAction> {
        let table = self.cache.current()?;
        let action = table.lookup(dpid, destination, in_port);
        trace!(dpid, %destination, in_port, next_hop = ?action.next_hop, "Forwarding lookup");
        Ok(action)
    }
}

/// GeoIP delegate broker answering from snapshot geo tables.
pub struct CachedGeoBroker {
    source: Arc<dyn SnapshotSource>,
    cache: SnapshotCache<BTreeMap<String, BTreeMap<String, (f64, f64)>>>,
}

impl CachedGeoBroker {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            source,
            cache: SnapshotCache::new(BrokerKind::Delegate),
        }
    }
}

#[async_trait]
impl GeoDelegateBroker for CachedGeoBroker {
    async fn build_cache(&self) -> Result<()> {
        let snapshot = self.source.load().await?;
        info!(
            source = %self.source.describe(),
            data_sources = snapshot.geo.len(),
            "Rebuilt geo cache"
        );
        self.cache.replace(snapshot.geo);
        Ok(())
    }

    async fn lookup(
        &self,
        data_source: Option<&str>,
        local_ids: &[String],
    ) -> Result<BTreeMap<String, GeoLocation>> {
        let tables = self.cache.current()?;
        let data_source = data_source.unwrap_or(DEFAULT_GEO_SOURCE);
        let Some(table) = tables.get(data_source) else {
            warn!(data_source, "Unknown geo data source");
            return Ok(BTreeMap::new());
        };

        Ok(local_ids
            .iter()
            .filter_map(|id| table.get(id).map(|loc| (id.clone(), GeoLocation::from(*loc))))
            .collect())
    }
}
