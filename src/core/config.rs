//! Configuration for the contour lifecycle and the viewer's stored preferences.
//!
//! `ContourLifecycleConfig` tunes the bounded-retry setup of the contour
//! source. `ViewerSettings` holds the preferences a user keeps across
//! sessions (provider keys, TiTiler endpoint, theme, custom sources); it
//! round-trips through JSON so it can live in any key/value store.

use crate::core::constants::{
    DEFAULT_TITILER_ENDPOINT, INIT_RETRY_DELAY_MS, MAX_INIT_ATTEMPTS, STYLE_RECHECK_DELAY_MS,
};
use crate::terrain::basemap::CustomBasemapSource;
use crate::terrain::custom::CustomTerrainSource;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ContourLifecycleConfig {
    /// Setup attempts per terrain source before the machine gives up.
    pub max_attempts: u32,
    /// Delay before an attempt after a trigger, and before re-checking an unloaded style.
    pub settle_delay_ms: u64,
    /// Delay before retrying a failed attempt.
    pub retry_delay_ms: u64,
}

impl ContourLifecycleConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ContourLifecycleConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_INIT_ATTEMPTS,
            settle_delay_ms: STYLE_RECHECK_DELAY_MS,
            retry_delay_ms: INIT_RETRY_DELAY_MS,
        }
    }
}

/// UI theme; contour layer colors follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Preferences persisted outside the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerSettings {
    pub mapbox_key: String,
    pub google_key: String,
    pub maptiler_key: String,
    pub titiler_endpoint: String,
    pub max_resolution: u32,
    pub theme: Theme,
    /// Serve COG sources through the `cog://` protocol instead of TiTiler.
    pub use_cog_protocol_vs_titiler: bool,
    pub custom_terrain_sources: Vec<CustomTerrainSource>,
    pub custom_basemap_sources: Vec<CustomBasemapSource>,
}

impl ViewerSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// TiTiler endpoint without a trailing slash
    pub fn titiler_base(&self) -> &str {
        self.titiler_endpoint.trim_end_matches('/')
    }

    pub fn custom_terrain_source(&self, id: &str) -> Option<&CustomTerrainSource> {
        self.custom_terrain_sources.iter().find(|s| s.id == id)
    }

    pub fn custom_basemap_source(&self, id: &str) -> Option<&CustomBasemapSource> {
        self.custom_basemap_sources.iter().find(|s| s.id == id)
    }
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            mapbox_key: String::new(),
            google_key: String::new(),
            maptiler_key: String::new(),
            titiler_endpoint: DEFAULT_TITILER_ENDPOINT.to_string(),
            max_resolution: 4096,
            theme: Theme::Light,
            use_cog_protocol_vs_titiler: false,
            custom_terrain_sources: Vec::new(),
            custom_basemap_sources: Vec::new(),
        }
    }
}
