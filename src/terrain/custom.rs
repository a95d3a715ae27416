//! User-defined terrain sources.

use crate::terrain::encoding::DemEncoding;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomSourceType {
    /// Cloud-Optimized GeoTIFF
    Cog,
    #[serde(rename = "terrainrgb")]
    TerrainRgb,
    Terrarium,
    /// GDAL virtual raster, only servable through TiTiler
    Vrt,
}

impl CustomSourceType {
    /// Encoding of the tiles the viewer ends up requesting. COG and VRT are
    /// rendered by TiTiler's `terrainrgb` algorithm.
    pub fn dem_encoding(&self) -> DemEncoding {
        match self {
            CustomSourceType::Terrarium => DemEncoding::Terrarium,
            CustomSourceType::Cog | CustomSourceType::TerrainRgb | CustomSourceType::Vrt => {
                DemEncoding::Mapbox
            }
        }
    }

    /// Whether the source needs a tile server in front of it
    pub fn is_raster_file(&self) -> bool {
        matches!(self, CustomSourceType::Cog | CustomSourceType::Vrt)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomTerrainSource {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub source_type: CustomSourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CustomTerrainSource {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        source_type: CustomSourceType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            source_type,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Generates an id for a source saved without one
pub fn generate_source_id(prefix: &str) -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{}-{}-{}", prefix, millis, NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Inserts `source`, or replaces the entry with the same id. Sources saved
/// without an id get a generated one. Returns the id.
pub fn upsert_terrain_source(
    sources: &mut Vec<CustomTerrainSource>,
    mut source: CustomTerrainSource,
) -> String {
    if source.id.is_empty() {
        source.id = generate_source_id("custom");
    }
    let id = source.id.clone();
    match sources.iter_mut().find(|existing| existing.id == id) {
        Some(existing) => *existing = source,
        None => sources.push(source),
    }
    id
}

/// Removes the source with `id`, returning it
pub fn remove_terrain_source(
    sources: &mut Vec<CustomTerrainSource>,
    id: &str,
) -> Option<CustomTerrainSource> {
    let index = sources.iter().position(|s| s.id == id)?;
    Some(sources.remove(index))
}
