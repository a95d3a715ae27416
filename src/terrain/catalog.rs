//! Built-in terrain sources.

use crate::terrain::encoding::TerrainEncoding;
use once_cell::sync::Lazy;

/// Placeholder substituted with the provider key at resolution time.
pub const API_KEY_PLACEHOLDER: &str = "{API_KEY}";

/// A tiled elevation source from the built-in catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSourceConfig {
    pub key: &'static str,
    pub name: &'static str,
    pub link: &'static str,
    pub description: &'static str,
    pub encoding: TerrainEncoding,
    pub tile_url_template: &'static str,
    pub tile_size: u32,
    pub max_zoom: u8,
}

impl TerrainSourceConfig {
    pub fn requires_api_key(&self) -> bool {
        self.tile_url_template.contains(API_KEY_PLACEHOLDER)
    }
}

static CATALOG: Lazy<Vec<TerrainSourceConfig>> = Lazy::new(|| {
    vec![
        TerrainSourceConfig {
            key: "mapterhorn",
            name: "Mapterhorn Terrarium",
            link: "https://mapterhorn.com/",
            description: "Mapterhorn terrain tiles with Terrarium encoding",
            encoding: TerrainEncoding::Terrarium,
            tile_url_template: "https://tiles.mapterhorn.com/{z}/{x}/{y}.webp",
            tile_size: 512,
            max_zoom: 14,
        },
        TerrainSourceConfig {
            key: "mapbox",
            name: "Mapbox TerrainRGB",
            link: "https://docs.mapbox.com/data/tilesets/reference/mapbox-terrain-dem-v1/",
            description: "Mapbox Terrain DEM v1 with TerrainRGB encoding",
            encoding: TerrainEncoding::TerrainRgb,
            tile_url_template:
                "https://api.mapbox.com/v4/mapbox.terrain-rgb/{z}/{x}/{y}.png?access_token={API_KEY}",
            tile_size: 256,
            max_zoom: 14,
        },
        TerrainSourceConfig {
            key: "maptiler",
            name: "MapTiler TerrainRGB",
            link: "https://www.maptiler.com/terrain/",
            description: "MapTiler terrain tiles with TerrainRGB encoding",
            encoding: TerrainEncoding::TerrainRgb,
            tile_url_template:
                "https://api.maptiler.com/tiles/terrain-rgb-v2/{z}/{x}/{y}.webp?key={API_KEY}",
            tile_size: 512,
            max_zoom: 12,
        },
        TerrainSourceConfig {
            key: "aws",
            name: "AWS Elevation Tiles (Mapzen Terrarium)",
            link: "https://registry.opendata.aws/terrain-tiles/",
            description: "AWS Terrain Tiles - Open Data Registry (Mapzen Terrarium encoding)",
            encoding: TerrainEncoding::Terrarium,
            tile_url_template: "https://s3.amazonaws.com/elevation-tiles-prod/terrarium/{z}/{x}/{y}.png",
            tile_size: 256,
            max_zoom: 15,
        },
    ]
});

/// Looks up a built-in source by key
pub fn builtin(key: &str) -> Option<&'static TerrainSourceConfig> {
    CATALOG.iter().find(|source| source.key == key)
}

/// All built-in sources in display order
pub fn builtins() -> &'static [TerrainSourceConfig] {
    &CATALOG
}
