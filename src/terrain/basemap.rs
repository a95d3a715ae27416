//! Raster basemaps drawn under the relief layers.

use crate::core::config::ViewerSettings;
use crate::surface::spec::SourceSpec;
use crate::terrain::resolver::encode_component;
use serde::{Deserialize, Serialize};

const BASEMAP_TILE_SIZE: u32 = 512;

/// Basemap used when the key is unknown.
const FALLBACK_BASEMAP: &str = "google";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomBasemapType {
    Cog,
    Tms,
    Wms,
    Wmts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomBasemapSource {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub source_type: CustomBasemapType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Tile URL of a built-in basemap. Mapbox satellite needs the user's key.
pub fn builtin_basemap_url(key: &str, mapbox_key: &str) -> Option<String> {
    let url = match key {
        "osm" => "https://a.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
        "googlesat" => "https://mt1.google.com/vt/lyrs=s&x={x}&y={y}&z={z}".to_string(),
        "google" => "https://mt1.google.com/vt/lyrs=y&x={x}&y={y}&z={z}".to_string(),
        "esri" => {
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
                .to_string()
        }
        "mapbox" => format!(
            "https://api.mapbox.com/v4/mapbox.satellite/{{z}}/{{x}}/{{y}}.jpg?access_token={}",
            mapbox_key
        ),
        _ => return None,
    };
    Some(url)
}

/// Resolves the raster basemap source for `key` (custom id or built-in key).
/// Unknown keys fall back to Google hybrid imagery.
pub fn raster_basemap_source(settings: &ViewerSettings, key: &str) -> SourceSpec {
    if let Some(custom) = settings.custom_basemap_source(key) {
        if custom.source_type == CustomBasemapType::Cog {
            if settings.use_cog_protocol_vs_titiler {
                return SourceSpec::Raster {
                    tiles: None,
                    url: Some(format!("cog://{}", custom.url)),
                    tile_size: BASEMAP_TILE_SIZE,
                };
            }
            let url = format!(
                "{}/cog/tiles/WebMercatorQuad/{{z}}/{{x}}/{{y}}.png?url={}",
                settings.titiler_base(),
                encode_component(&custom.url)
            );
            return SourceSpec::Raster {
                tiles: Some(vec![url]),
                url: None,
                tile_size: BASEMAP_TILE_SIZE,
            };
        }
        return SourceSpec::Raster {
            tiles: Some(vec![custom.url.clone()]),
            url: None,
            tile_size: BASEMAP_TILE_SIZE,
        };
    }

    let url = builtin_basemap_url(key, &settings.mapbox_key)
        .or_else(|| builtin_basemap_url(FALLBACK_BASEMAP, &settings.mapbox_key))
        .unwrap_or_default();
    SourceSpec::Raster {
        tiles: Some(vec![url]),
        url: None,
        tile_size: BASEMAP_TILE_SIZE,
    }
}
