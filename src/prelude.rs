//! Prelude module for common relief types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use relief::prelude::*;`

pub use crate::core::{
    config::{ContourLifecycleConfig, Theme, ViewerSettings},
    geo::{tiles_covering, LatLng, LatLngBounds, TileCoord},
};

pub use crate::terrain::{
    basemap::{CustomBasemapSource, CustomBasemapType},
    catalog::TerrainSourceConfig,
    custom::{CustomSourceType, CustomTerrainSource},
    encoding::DemEncoding,
    resolver::{ElevationSourceResolver, ResolvedElevationSource},
};

pub use crate::contour::{
    cache::DemTileCache,
    fetch::TileFetcher,
    handler::{ContourGenerator, DemTile},
    options::{ContourRequest, ContourTileOptions},
    source::{ContourTileSource, DemSourceOptions},
    thresholds::ContourThresholdTable,
};

#[cfg(feature = "http")]
pub use crate::contour::fetch::HttpTileFetcher;

pub use crate::protocol::{ProtocolHandler, ProtocolRegistry};

pub use crate::surface::{
    controller::{ContourVisibility, MapSurfaceController},
    engine::MapEngine,
    memory::InMemoryMap,
    spec::{LayerKind, LayerSpec, SourceSpec},
};

pub use crate::lifecycle::{
    initializer::{AttemptReason, ContourInitializer, ContourSourceHandle},
    state::{InitAttemptCounter, InitState},
};

pub use crate::viewer::{
    hillshade::hillshade_paint,
    state::ViewerState,
    terrain_viewer::{MapEvent, TerrainViewer},
};

pub use crate::{Result, ViewerError};

pub use instant::Instant;
pub use std::{sync::Arc, time::Duration};

pub use fxhash::FxHashMap as HashMap;
