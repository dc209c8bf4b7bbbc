//! Entity property services.
//!
//! Both services are thin: an optional cache rebuild followed by direct
//! broker lookups.

use alto_broker::{BrokerContext, EndpointBroker, GeoDelegateBroker};
use alto_types::{props, EndpointId, PropertyBag};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::service::{EndpointPropertyMap, EntityPropertyService, PropertyMap};
use crate::Result;

/// Backend of the endpoint property service.
pub struct EndpointPropertyService {
    config: ServiceConfig,
    endpoints: Arc<dyn EndpointBroker>,
}

impl EndpointPropertyService {
    pub fn new(ctx: &BrokerContext, namespace: &str, config: ServiceConfig) -> Result<Self> {
        Ok(Self::from_broker(ctx.endpoint(namespace)?, config))
    }

    pub fn from_broker(endpoints: Arc<dyn EndpointBroker>, config: ServiceConfig) -> Self {
        Self { config, endpoints }
    }
}

#[async_trait]
impl EntityPropertyService for EndpointPropertyService {
    type Properties = EndpointPropertyMap;

    fn name(&self) -> &str {
        "EndpointPropertyService"
    }

    /// Every requested endpoint gets an entry; unknown endpoints map to
    /// `None`. Without `property_names` every property of each endpoint is
    /// returned.
    async fn lookup(
        &self,
        entities: &[EndpointId],
        property_names: Option<&BTreeSet<String>>,
    ) -> Result<EndpointPropertyMap> {
        if self.config.autoreload {
            self.endpoints.build_cache().await?;
        }

        let names: Option<Vec<&str>> =
            property_names.map(|names| names.iter().map(String::as_str).collect());

        let mut property_map = EndpointPropertyMap::new();
        for endpoint in entities {
            let bag = self.endpoints.lookup(endpoint, names.as_deref()).await?;
            if bag.is_none() {
                debug!(%endpoint, "Unknown endpoint");
            }
            property_map.insert(endpoint.clone(), bag);
        }
        Ok(property_map)
    }
}

/// Backend of the entity property service backed by a GeoIP delegate.
pub struct GeoIpPropertyService {
    config: ServiceConfig,
    geo: Arc<dyn GeoDelegateBroker>,
}

impl GeoIpPropertyService {
    pub fn new(ctx: &BrokerContext, namespace: &str, config: ServiceConfig) -> Result<Self> {
        Ok(Self::from_broker(ctx.geo(namespace)?, config))
    }

    pub fn from_broker(geo: Arc<dyn GeoDelegateBroker>, config: ServiceConfig) -> Self {
        Self { config, geo }
    }

    /// Groups local ids by routing domain, keeping request order.
    fn group_by_domain(entities: &[EndpointId]) -> BTreeMap<&str, Vec<String>> {
        let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for entity in entities {
            match entity.split_domain() {
                Some((domain, local_id)) => {
                    grouped.entry(domain).or_default().push(local_id.to_string())
                }
                None => debug!(%entity, "Skipping entity without routing domain"),
            }
        }
        grouped
    }
}

#[async_trait]
impl EntityPropertyService for GeoIpPropertyService {
    type Properties = PropertyMap;

    fn name(&self) -> &str {
        "GeoIpPropertyService"
    }

    /// Every resolved entity gets a `geolocation` property and unresolved
    /// entities are omitted; the requested property names are not consulted.
    async fn lookup(
        &self,
        entities: &[EndpointId],
        _property_names: Option<&BTreeSet<String>>,
    ) -> Result<PropertyMap> {
        if self.config.autoreload {
            self.geo.build_cache().await?;
        }

        let data_source = self.config.geo_data_source.as_deref();
        let mut property_map = PropertyMap::new();
        for (domain, local_ids) in Self::group_by_domain(entities) {
            let locations = self.geo.lookup(data_source, &local_ids).await?;
            for (local_id, location) in locations {
                let mut bag = PropertyBag::new();
                bag.insert(
                    props::GEOLOCATION.to_string(),
                    json!({ "lat": location.lat, "lng": location.lng }),
                );
                property_map.insert(EndpointId::new(format!("{domain}:{local_id}")), bag);
            }
        }

        info!(
            requested = entities.len(),
            resolved = property_map.len(),
            "Resolved geolocations"
        );
        Ok(property_map)
    }
}
