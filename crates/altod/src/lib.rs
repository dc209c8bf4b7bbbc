//! ALTO backend daemon library.
//!
//! Wires configuration to brokers and services, and renders service
//! results as ALTO response bodies. The `altod` binary is a thin
//! command-line front end over [`commands`].

pub mod commands;
pub mod config;
pub mod render;

pub use config::{AltoConfig, ConfigError, NamespaceConfig};
pub use render::{MultipartEncoder, MultipartPart, RenderError};
