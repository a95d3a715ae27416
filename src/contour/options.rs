//! Contour tile framing options and their protocol URL encoding.

use crate::contour::thresholds::ContourThresholdTable;
use crate::core::constants::{
    CONTOUR_SOURCE_LAYER, CONTOUR_TILE_BUFFER, CONTOUR_TILE_EXTENT, ELEVATION_KEY, LEVEL_KEY,
};
use crate::core::geo::TileCoord;
use crate::{Result, ViewerError};

/// Parameters baked into a contour protocol URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourTileOptions {
    /// Factor applied to elevations before contouring (e.g. 3.28084 for feet)
    pub multiplier: f64,
    pub thresholds: ContourThresholdTable,
    pub contour_layer: String,
    pub elevation_key: String,
    pub level_key: String,
    pub extent: u32,
    pub buffer: u32,
}

impl ContourTileOptions {
    /// Options with the viewer's framing: `contours` layer, `ele`/`level`
    /// keys, 4096 extent, 1px buffer, elevations in meters.
    pub fn new(thresholds: ContourThresholdTable) -> Self {
        Self {
            multiplier: 1.0,
            thresholds,
            contour_layer: CONTOUR_SOURCE_LAYER.to_string(),
            elevation_key: ELEVATION_KEY.to_string(),
            level_key: LEVEL_KEY.to_string(),
            extent: CONTOUR_TILE_EXTENT,
            buffer: CONTOUR_TILE_BUFFER,
        }
    }

    /// Query string with keys in sorted order, so identical options always
    /// produce identical URLs.
    pub fn encode_query(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("buffer", &self.buffer.to_string())
            .append_pair("contourLayer", &self.contour_layer)
            .append_pair("elevationKey", &self.elevation_key)
            .append_pair("extent", &self.extent.to_string())
            .append_pair("levelKey", &self.level_key)
            .append_pair("multiplier", &self.multiplier.to_string())
            .append_pair("thresholds", &self.thresholds.encode())
            .finish()
    }

    /// Parses a query produced by [`encode_query`](Self::encode_query).
    /// Missing framing keys take the viewer defaults; thresholds are required.
    pub fn decode_query(query: &str) -> Result<Self> {
        let invalid = |detail: String| ViewerError::InvalidProtocolUrl(detail);

        let mut thresholds = None;
        let mut options = ContourTileOptions::new(ContourThresholdTable::decode("")?);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "buffer" => {
                    options.buffer = value.parse().map_err(|_| invalid(format!("buffer={}", value)))?
                }
                "extent" => {
                    options.extent = value.parse().map_err(|_| invalid(format!("extent={}", value)))?
                }
                "multiplier" => {
                    options.multiplier =
                        value.parse().map_err(|_| invalid(format!("multiplier={}", value)))?
                }
                "contourLayer" => options.contour_layer = value.into_owned(),
                "elevationKey" => options.elevation_key = value.into_owned(),
                "levelKey" => options.level_key = value.into_owned(),
                "thresholds" => thresholds = Some(ContourThresholdTable::decode(&value)?),
                other => log::debug!("ignoring unknown contour option '{}'", other),
            }
        }

        options.thresholds = thresholds.ok_or_else(|| invalid("missing thresholds".to_string()))?;
        Ok(options)
    }
}

/// A concrete contour tile request, e.g. `dem-contour://12/2135/1457?...`
#[derive(Debug, Clone, PartialEq)]
pub struct ContourRequest {
    pub scheme: String,
    pub coord: TileCoord,
    pub options: ContourTileOptions,
}

impl ContourRequest {
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = || ViewerError::InvalidProtocolUrl(url.to_string());

        let (scheme, rest) = url.split_once("://").ok_or_else(invalid)?;
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

        let parts: Vec<&str> = path.trim_end_matches('/').split('/').collect();
        let [z, x, y] = parts.as_slice() else {
            return Err(invalid());
        };
        let coord = TileCoord::new(
            x.parse().map_err(|_| invalid())?,
            y.parse().map_err(|_| invalid())?,
            z.parse().map_err(|_| invalid())?,
        );
        if !coord.is_valid() {
            return Err(invalid());
        }

        Ok(Self {
            scheme: scheme.to_string(),
            coord,
            options: ContourTileOptions::decode_query(query)?,
        })
    }
}
