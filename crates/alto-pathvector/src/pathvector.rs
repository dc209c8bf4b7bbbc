//! PathVectorService - ANE paths for batches of flows.
//!
//! For every flow whose source is a known, locally originated endpoint the
//! service walks the forwarding state from the flow's ingress point (see
//! [`traversal`](crate::traversal)), appends an aggregated AS segment when
//! the last hop reports an AS path, and stores the result under
//! `paths[source][destination]`. ANE names and properties are shared across
//! the flows of one call and discarded afterwards.

use alto_broker::{BrokerContext, EndpointBroker, ForwardingBroker};
use alto_types::{props, EndpointId, Flow, SwitchAction};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::registry::{AnePropertyMap, BatchState};
use crate::service::FlowPathService;
use crate::traversal::NextHopWalker;
use crate::value::is_truthy;
use crate::Result;

/// Paths keyed by source, then destination.
pub type PathsTable = BTreeMap<EndpointId, BTreeMap<EndpointId, Vec<String>>>;

/// Result of one path-vector lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathVectorResult {
    pub paths: PathsTable,
    /// Requested properties of every ANE the batch touched.
    pub properties: AnePropertyMap,
}

impl PathVectorResult {
    /// Returns the path computed for `source → destination`, if any.
    pub fn path(&self, source: &str, destination: &str) -> Option<&[String]> {
        self.paths
            .get(source)
            .and_then(|by_dst| by_dst.get(destination))
            .map(Vec::as_slice)
    }
}

/// Keeps only the requested properties of every ANE.
///
/// ANEs left without properties stay in the map with an empty bag.
pub fn filter_properties(properties: &mut AnePropertyMap, property_names: &BTreeSet<String>) {
    for bag in properties.values_mut() {
        bag.retain(|name, _| property_names.contains(name));
    }
}

/// Backend of the endpoint cost service with the path-vector extension.
pub struct PathVectorService {
    config: ServiceConfig,
    endpoints: Arc<dyn EndpointBroker>,
    forwarding: Arc<dyn ForwardingBroker>,
}

impl PathVectorService {
    /// Creates the service for `namespace` from its registered brokers.
    pub fn new(ctx: &BrokerContext, namespace: &str, config: ServiceConfig) -> Result<Self> {
        Ok(Self::from_brokers(
            ctx.endpoint(namespace)?,
            ctx.forwarding(namespace)?,
            config,
        ))
    }

    pub fn from_brokers(
        endpoints: Arc<dyn EndpointBroker>,
        forwarding: Arc<dyn ForwardingBroker>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            config,
            endpoints,
            forwarding,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns true when `source` is known and locally originated.
    async fn is_local_source(&self, source: &EndpointId) -> Result<bool> {
        let Some(source_props) = self.endpoints.lookup(source, None).await? else {
            debug!(%source, "Skipping flow from unknown source");
            return Ok(false);
        };
        if !is_truthy(source_props.get(props::IS_LOCAL)) {
            debug!(%source, "Skipping flow from non-local source");
            return Ok(false);
        }
        Ok(true)
    }

    /// Appends the aggregated AS segment of `last_action` to `path`.
    fn append_as_segment(
        last_action: Option<&SwitchAction>,
        path: &mut Vec<String>,
        batch: &mut BatchState,
        property_names: &BTreeSet<String>,
    ) {
        let Some(as_path) = last_action.and_then(SwitchAction::transit_as_path) else {
            return;
        };
        let assigned = batch.registry.as_path(&as_path);
        if assigned.is_new {
            let bag = batch.properties.entry(assigned.name.clone()).or_default();
            if property_names.contains(props::AS_PATH) {
                bag.insert(props::AS_PATH.to_string(), Value::String(as_path));
            }
        }
        path.push(assigned.name);
    }
}

#[async_trait]
impl FlowPathService for PathVectorService {
    fn name(&self) -> &str {
        "PathVectorService"
    }

    async fn lookup(
        &self,
        flows: &[Flow],
        property_names: &BTreeSet<String>,
    ) -> Result<PathVectorResult> {
        if self.config.autoreload {
            self.forwarding.build_cache().await?;
            self.endpoints.build_cache().await?;
        }

        let walker = NextHopWalker::new(self.endpoints.as_ref(), self.forwarding.as_ref());
        let mut batch = BatchState::new();
        let mut paths = PathsTable::new();

        for flow in flows {
            let (ingress, source, destination) = flow.parts();
            if !self.is_local_source(source).await? {
                continue;
            }

            let traversal = walker.walk(ingress, destination, &mut batch).await?;
            let mut path = traversal.path;
            Self::append_as_segment(
                traversal.last_action.as_ref(),
                &mut path,
                &mut batch,
                property_names,
            );

            paths
                .entry(source.clone())
                .or_default()
                .insert(destination.clone(), path);
        }

        let mut properties = batch.properties;
        filter_properties(&mut properties, property_names);

        info!(
            flows = flows.len(),
            sources = paths.len(),
            anes = properties.len(),
            autolinks = batch.registry.link_count(),
            autopaths = batch.registry.as_path_count(),
            "Computed path vectors"
        );

        Ok(PathVectorResult { paths, properties })
    }
}
