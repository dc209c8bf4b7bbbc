//! One-shot service invocations.
//!
//! Each command builds the service for a namespace, runs one lookup and
//! returns the rendered response.

use alto_broker::BrokerContext;
use alto_pathvector::{
    EndpointPropertyService, EntityPropertyService, FlowPathService, GeoIpPropertyService,
    PathVectorService,
};
use alto_types::{EndpointId, Flow};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use tracing::info;

use crate::config::AltoConfig;
use crate::render::{self, MultipartEncoder};

/// A rendered response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Service runner bound to one namespace.
pub struct Runner {
    config: AltoConfig,
    ctx: BrokerContext,
    namespace: String,
}

impl Runner {
    pub fn new(config: AltoConfig, namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        config.namespace(&namespace)?;
        let ctx = config.build_context();
        Ok(Self {
            config,
            ctx,
            namespace,
        })
    }

    fn service_config(&self) -> Result<alto_pathvector::ServiceConfig> {
        Ok(self.config.namespace(&self.namespace)?.service.clone())
    }

    /// Path-vector lookup, rendered as multipart/related.
    pub async fn path_vector(
        &self,
        flows: &[Flow],
        property_names: &BTreeSet<String>,
        encoder: &MultipartEncoder,
    ) -> Result<Response> {
        let service = PathVectorService::new(&self.ctx, &self.namespace, self.service_config()?)?;
        info!(service = service.name(), namespace = %self.namespace, flows = flows.len(), "Lookup");

        let result = service
            .lookup(flows, property_names)
            .await
            .context("path-vector lookup failed")?;
        let (content_type, body) = render::render_path_vector(encoder, &result)?;
        Ok(Response { content_type, body })
    }

    /// Endpoint property lookup.
    pub async fn endpoint_properties(
        &self,
        endpoints: &[EndpointId],
        property_names: Option<&BTreeSet<String>>,
    ) -> Result<Response> {
        let service =
            EndpointPropertyService::new(&self.ctx, &self.namespace, self.service_config()?)?;
        info!(service = service.name(), namespace = %self.namespace, endpoints = endpoints.len(), "Lookup");

        let properties = service
            .lookup(endpoints, property_names)
            .await
            .context("endpoint property lookup failed")?;
        Self::json_response(
            render::media_types::ENDPOINT_PROP,
            &render::render_endpoint_properties(&properties),
        )
    }

    /// Geolocation lookup, rendered as an entity property map.
    pub async fn geolocation(&self, entities: &[EndpointId]) -> Result<Response> {
        let service =
            GeoIpPropertyService::new(&self.ctx, &self.namespace, self.service_config()?)?;
        info!(service = service.name(), namespace = %self.namespace, entities = entities.len(), "Lookup");

        let properties = service
            .lookup(entities, None)
            .await
            .context("geolocation lookup failed")?;
        Self::json_response(
            render::media_types::PROPMAP,
            &render::render_property_map(&properties),
        )
    }

    fn json_response(content_type: &str, body: &serde_json::Value) -> Result<Response> {
        Ok(Response {
            content_type: content_type.to_string(),
            body: serde_json::to_vec_pretty(body)?,
        })
    }
}
