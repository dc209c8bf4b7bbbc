//! ALTO path-vector backend.
//!
//! This crate computes the data behind an ALTO endpoint cost service with
//! the path-vector extension, plus the two entity property services:
//!
//! - [`PathVectorService`]: flows → ANE paths and ANE properties
//! - [`EndpointPropertyService`]: endpoints → endpoint properties
//! - [`GeoIpPropertyService`]: entities → geolocation
//!
//! # Architecture
//!
//! ```text
//! flows ──▶ PathVectorService ──▶ NextHopWalker ──▶ ForwardingBroker
//!                 │                     │
//!                 │ is_local?           │ dpid / in_port / incoming_links
//!                 ▼                     ▼
//!           EndpointBroker ◀────────────┘
//!
//!           BatchState (AneRegistry + ANE properties), one per call
//! ```
//!
//! Services get their brokers from an [`alto_broker::BrokerContext`] and
//! are exposed to the northbound layer through the [`FlowPathService`]
//! and [`EntityPropertyService`] traits.
//!
//! # Example
//!
//! ```ignore
//! use alto_pathvector::{FlowPathService, PathVectorService, ServiceConfig};
//!
//! let service = PathVectorService::new(&ctx, "default", ServiceConfig::default())?;
//! let result = service.lookup(&flows, &property_names).await?;
//! for (src, by_dst) in &result.paths { /* ... */ }
//! ```

mod config;
mod error;
mod pathvector;
mod property;
mod registry;
mod service;
mod traversal;
mod value;

pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use pathvector::{filter_properties, PathVectorResult, PathVectorService, PathsTable};
pub use property::{EndpointPropertyService, GeoIpPropertyService};
pub use registry::{AnePropertyMap, AneRegistry, Assigned, BatchState};
pub use service::{EndpointPropertyMap, EntityPropertyService, FlowPathService, PropertyMap};
pub use traversal::{NextHopWalker, Traversal, DEFAULT_IN_PORT};
