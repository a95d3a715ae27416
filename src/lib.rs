//! # relief
//!
//! Headless core of an interactive terrain viewer.
//!
//! The crate resolves terrain (elevation) sources, derives contour vector tiles
//! on demand from elevation-encoded raster tiles, and keeps a map surface's
//! contour source and layers consistent with live parameter changes. The map
//! rendering engine and the contour math stay behind traits
//! ([`MapEngine`], [`ContourGenerator`]).

pub mod contour;
pub mod core;
pub mod lifecycle;
pub mod prelude;
pub mod protocol;
pub mod surface;
pub mod terrain;
pub mod viewer;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    config::{ContourLifecycleConfig, Theme, ViewerSettings},
    geo::{LatLng, LatLngBounds, TileCoord},
};

pub use terrain::{
    catalog::TerrainSourceConfig,
    custom::{CustomSourceType, CustomTerrainSource},
    encoding::DemEncoding,
    resolver::{ElevationSourceResolver, ResolvedElevationSource},
};

pub use contour::{
    fetch::TileFetcher,
    handler::{ContourGenerator, DemTile},
    options::ContourTileOptions,
    source::{ContourTileSource, DemSourceOptions},
    thresholds::ContourThresholdTable,
};

pub use protocol::{ProtocolHandler, ProtocolRegistry};

pub use surface::{
    controller::{ContourVisibility, MapSurfaceController},
    engine::MapEngine,
    memory::InMemoryMap,
    spec::{LayerSpec, SourceSpec},
};

pub use lifecycle::{
    initializer::{ContourInitializer, ContourSourceHandle},
    state::{InitAttemptCounter, InitState},
};

pub use viewer::{
    state::ViewerState,
    terrain_viewer::{MapEvent, TerrainViewer},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Query string error: {0}")]
    QueryString(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Source already exists: {0}")]
    SourceExists(String),

    #[error("Source {source_id} is still used by layer {layer_id}")]
    SourceInUse { source_id: String, layer_id: String },

    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    #[error("Layer already exists: {0}")]
    LayerExists(String),

    #[error("Invalid contour thresholds: {0}")]
    InvalidThresholds(String),

    #[error("Invalid protocol URL: {0}")]
    InvalidProtocolUrl(String),

    #[error("No protocol handler registered for scheme {0}")]
    UnknownProtocol(String),

    #[error("Timed out after {timeout_ms}ms fetching {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Contour generation error: {0}")]
    Generator(String),

    #[error("Worker error: {0}")]
    Worker(String),
}

/// Error type alias for convenience
pub type Error = ViewerError;

impl From<serde_urlencoded::de::Error> for ViewerError {
    fn from(err: serde_urlencoded::de::Error) -> Self {
        ViewerError::QueryString(err.to_string())
    }
}

impl From<serde_urlencoded::ser::Error> for ViewerError {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        ViewerError::QueryString(err.to_string())
    }
}
