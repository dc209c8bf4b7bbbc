//! Service configuration.

use serde::{Deserialize, Serialize};

/// Configuration shared by the ALTO services of one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Rebuild broker caches before every lookup.
    pub autoreload: bool,
    /// GeoIP data source; `None` lets the broker pick its default.
    pub geo_data_source: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            autoreload: true,
            geo_data_source: None,
        }
    }
}

impl ServiceConfig {
    pub fn with_autoreload(mut self, autoreload: bool) -> Self {
        self.autoreload = autoreload;
        self
    }

    pub fn with_geo_data_source(mut self, data_source: impl Into<String>) -> Self {
        self.geo_data_source = Some(data_source.into());
        self
    }
}
