use serde::{Deserialize, Serialize};

/// How elevation is packed into the RGB channels of a DEM tile, named the way
/// decoders and raster-dem sources expect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DemEncoding {
    Terrarium,
    /// TerrainRGB packing
    #[default]
    Mapbox,
}

impl DemEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemEncoding::Terrarium => "terrarium",
            DemEncoding::Mapbox => "mapbox",
        }
    }
}

impl std::fmt::Display for DemEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding as advertised by a terrain catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainEncoding {
    Terrarium,
    #[serde(rename = "terrainrgb")]
    TerrainRgb,
}

impl TerrainEncoding {
    pub fn dem_encoding(&self) -> DemEncoding {
        match self {
            TerrainEncoding::Terrarium => DemEncoding::Terrarium,
            TerrainEncoding::TerrainRgb => DemEncoding::Mapbox,
        }
    }
}
