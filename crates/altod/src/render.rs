//! ALTO response bodies.
//!
//! Path-vector responses are `multipart/related`: an endpoint cost part
//! listing the ANE names of every path, and a property map part holding
//! the ANE properties. The property services render as plain JSON objects.

use alto_pathvector::{EndpointPropertyMap, PathVectorResult, PropertyMap};
use serde_json::{json, Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Media types of the ALTO resources served here.
pub mod media_types {
    pub const ENDPOINT_COST: &str = "application/alto-endpointcost+json";
    pub const ENDPOINT_PROP: &str = "application/alto-endpointprop+json";
    pub const PROPMAP: &str = "application/alto-propmap+json";
    pub const MULTIPART_RELATED: &str = "multipart/related";
}

/// Content-ID of the endpoint cost part.
pub const ECS_CONTENT_ID: &str = "<ecs@alto>";
/// Content-ID of the property map part.
pub const PROPMAP_CONTENT_ID: &str = "<propmap@alto>";
/// Prefix of ANE entity identifiers in property maps.
pub const ANE_ENTITY_PREFIX: &str = ".ane:";

const CHARSET: &str = "utf-8";

/// Rendering errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Malformed part {index}: {reason}")]
    MalformedPart { index: usize, reason: String },

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// One part of a multipart/related body.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPart {
    pub content_type: String,
    pub content_id: String,
    pub body: Value,
}

impl MultipartPart {
    pub fn new(content_type: impl Into<String>, content_id: impl Into<String>, body: Value) -> Self {
        Self {
            content_type: content_type.into(),
            content_id: content_id.into(),
            body,
        }
    }

    fn check(&self, index: usize) -> Result<(), RenderError> {
        let malformed = |reason: &str| RenderError::MalformedPart {
            index,
            reason: reason.to_string(),
        };
        if self.content_type.is_empty() {
            return Err(malformed("empty Content-Type"));
        }
        if self.content_id.is_empty() {
            return Err(malformed("empty Content-ID"));
        }
        if has_line_break(&self.content_type) || has_line_break(&self.content_id) {
            return Err(malformed("header value contains a line break"));
        }
        Ok(())
    }
}

fn has_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

/// Encodes multipart/related bodies with a fixed boundary.
#[derive(Debug, Clone)]
pub struct MultipartEncoder {
    boundary: String,
}

impl Default for MultipartEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartEncoder {
    /// Creates an encoder with a random boundary.
    pub fn new() -> Self {
        Self {
            boundary: Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Content-Type of the whole multipart body.
    pub fn content_type(&self) -> String {
        format!(
            "{}; boundary={}; type={}; charset={}",
            media_types::MULTIPART_RELATED,
            self.boundary,
            media_types::ENDPOINT_COST,
            CHARSET
        )
    }

    /// Encodes `parts`. Nothing is written if any part is malformed.
    pub fn encode(&self, parts: &[MultipartPart]) -> Result<Vec<u8>, RenderError> {
        let mut lines: Vec<String> = Vec::with_capacity(parts.len() * 5 + 2);
        for (index, part) in parts.iter().enumerate() {
            part.check(index)?;
            lines.push(format!("--{}", self.boundary));
            lines.push(format!("Content-Type: {}", part.content_type));
            lines.push(format!("Content-ID: {}", part.content_id));
            lines.push(String::new());
            lines.push(serde_json::to_string(&part.body)?);
        }
        lines.push(format!("--{}--", self.boundary));
        lines.push(String::new());
        Ok(lines.join("\r\n").into_bytes())
    }
}

/// Body of the endpoint cost part.
pub fn endpoint_cost_body(result: &PathVectorResult) -> Value {
    json!({
        "meta": {
            "cost-type": { "cost-mode": "array", "cost-metric": "ane-path" }
        },
        "endpoint-cost-map": result.paths,
    })
}

/// Body of the ANE property map part.
pub fn ane_property_map_body(result: &PathVectorResult) -> Value {
    let property_map: Map<String, Value> = result
        .properties
        .iter()
        .map(|(ane, bag)| {
            let props: Map<String, Value> =
                bag.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            (format!("{ANE_ENTITY_PREFIX}{ane}"), Value::Object(props))
        })
        .collect();
    json!({ "property-map": property_map })
}

/// Renders a path-vector result as a multipart/related body, returning
/// the envelope Content-Type and the encoded bytes.
pub fn render_path_vector(
    encoder: &MultipartEncoder,
    result: &PathVectorResult,
) -> Result<(String, Vec<u8>), RenderError> {
    let parts = [
        MultipartPart::new(
            media_types::ENDPOINT_COST,
            ECS_CONTENT_ID,
            endpoint_cost_body(result),
        ),
        MultipartPart::new(
            media_types::PROPMAP,
            PROPMAP_CONTENT_ID,
            ane_property_map_body(result),
        ),
    ];
    Ok((encoder.content_type(), encoder.encode(&parts)?))
}

/// Endpoint property service response body. Unknown endpoints render as
/// `null`.
pub fn render_endpoint_properties(properties: &EndpointPropertyMap) -> Value {
    json!({ "endpoint-properties": properties })
}

/// Entity property map response body.
pub fn render_property_map(properties: &PropertyMap) -> Value {
    json!({ "property-map": properties })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alto_types::{EndpointId, PropertyBag};
    use pretty_assertions::assert_eq;

    fn result() -> PathVectorResult {
        let mut result = PathVectorResult::default();
        result.paths.entry(EndpointId::new("ipv4:10.0.0.1")).or_default().insert(
            EndpointId::new("ipv4:10.0.5.5"),
            vec!["autolink_1".to_string(), "autopath_1".to_string()],
        );
        let mut bag = PropertyBag::new();
        bag.insert("as_path".to_string(), json!("64500 64501"));
        result.properties.insert("autopath_1".to_string(), bag);
        result.properties.insert("autolink_1".to_string(), PropertyBag::new());
        result
    }

    #[test]
    fn test_encode_layout() {
        let encoder = MultipartEncoder::with_boundary("B");
        let body = encoder
            .encode(&[MultipartPart::new("application/json", "<a@x>", json!({"k": 1}))])
            .unwrap();

        assert_eq!(
            String::from_utf8(body).unwrap(),
            "--B\r\nContent-Type: application/json\r\nContent-ID: <a@x>\r\n\r\n{\"k\":1}\r\n--B--\r\n"
        );
    }

    #[test]
    fn test_content_type() {
        let encoder = MultipartEncoder::with_boundary("abc");
        assert_eq!(
            encoder.content_type(),
            "multipart/related; boundary=abc; type=application/alto-endpointcost+json; charset=utf-8"
        );
        assert_ne!(MultipartEncoder::new().boundary(), MultipartEncoder::new().boundary());
    }

    #[test]
    fn test_malformed_parts_are_rejected() {
        let encoder = MultipartEncoder::with_boundary("B");
        let good = MultipartPart::new("application/json", "<a@x>", json!({}));

        let cases = [
            (MultipartPart::new("", "<b@x>", json!({})), "empty Content-Type"),
            (MultipartPart::new("application/json", "", json!({})), "empty Content-ID"),
            (
                MultipartPart::new("application/json\r\nX-Evil: 1", "<b@x>", json!({})),
                "header value contains a line break",
            ),
        ];
        for (bad, expected) in cases {
            match encoder.encode(&[good.clone(), bad]) {
                Err(RenderError::MalformedPart { index, reason }) => {
                    assert_eq!(index, 1);
                    assert_eq!(reason, expected);
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[test]
    fn test_path_vector_parts() {
        let result = result();

        assert_eq!(
            endpoint_cost_body(&result),
            json!({
                "meta": { "cost-type": { "cost-mode": "array", "cost-metric": "ane-path" } },
                "endpoint-cost-map": {
                    "ipv4:10.0.0.1": { "ipv4:10.0.5.5": ["autolink_1", "autopath_1"] }
                }
            })
        );
        assert_eq!(
            ane_property_map_body(&result),
            json!({
                "property-map": {
                    ".ane:autolink_1": {},
                    ".ane:autopath_1": { "as_path": "64500 64501" }
                }
            })
        );
    }

    #[test]
    fn test_render_path_vector() {
        let encoder = MultipartEncoder::with_boundary("B");
        let (content_type, body) = render_path_vector(&encoder, &result()).unwrap();
        let body = String::from_utf8(body).unwrap();

        assert!(content_type.starts_with("multipart/related; boundary=B;"));
        assert!(body.starts_with("--B\r\nContent-Type: application/alto-endpointcost+json\r\nContent-ID: <ecs@alto>\r\n"));
        assert!(body.contains("Content-Type: application/alto-propmap+json\r\nContent-ID: <propmap@alto>\r\n"));
        assert!(body.ends_with("--B--\r\n"));
    }

    #[test]
    fn test_property_bodies() {
        let mut bag = PropertyBag::new();
        bag.insert("dpid".to_string(), json!("sw1"));

        let mut endpoints = EndpointPropertyMap::new();
        endpoints.insert(EndpointId::new("ipv4:10.0.0.1"), Some(bag.clone()));
        endpoints.insert(EndpointId::new("ipv4:10.9.9.9"), None);
        assert_eq!(
            render_endpoint_properties(&endpoints),
            json!({
                "endpoint-properties": {
                    "ipv4:10.0.0.1": { "dpid": "sw1" },
                    "ipv4:10.9.9.9": null
                }
            })
        );

        let mut properties = PropertyMap::new();
        properties.insert(EndpointId::new("ipv4:10.0.0.1"), bag);
        assert_eq!(
            render_property_map(&properties),
            json!({ "property-map": { "ipv4:10.0.0.1": { "dpid": "sw1" } } })
        );
    }
}
