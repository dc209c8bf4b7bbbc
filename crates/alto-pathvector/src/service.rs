//! Capability traits implemented by the ALTO services.
//!
//! The northbound layer depends on these traits rather than on concrete
//! services: one for flow-to-path computations, one for entity property
//! lookups.

use alto_types::{EndpointId, Flow, PropertyBag};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

use crate::pathvector::PathVectorResult;
use crate::Result;

/// Properties per entity.
pub type PropertyMap = BTreeMap<EndpointId, PropertyBag>;

/// Properties per requested endpoint; `None` marks an endpoint the broker
/// does not know.
pub type EndpointPropertyMap = BTreeMap<EndpointId, Option<PropertyBag>>;

/// Computes paths for batches of flows.
#[async_trait]
pub trait FlowPathService: Send + Sync {
    /// Returns the name of this service (for logging).
    fn name(&self) -> &str;

    /// Computes a path for every locally originated flow and the
    /// requested properties of every ANE on those paths.
    async fn lookup(
        &self,
        flows: &[Flow],
        property_names: &BTreeSet<String>,
    ) -> Result<PathVectorResult>;
}

/// Resolves properties of entities.
#[async_trait]
pub trait EntityPropertyService: Send + Sync {
    /// Mapping produced by one lookup.
    type Properties: Send;

    /// Returns the name of this service (for logging).
    fn name(&self) -> &str;

    /// Looks up the properties of `entities`.
    async fn lookup(
        &self,
        entities: &[EndpointId],
        property_names: Option<&BTreeSet<String>>,
    ) -> Result<Self::Properties>;
}
