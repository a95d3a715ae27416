//! Engine-facing descriptions of sources and layers.
//!
//! Both serialize to the style-spec JSON shape map engines consume, so an
//! engine binding can forward them without translation.

use crate::terrain::encoding::DemEncoding;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceSpec {
    Vector {
        tiles: Vec<String>,
        maxzoom: u8,
    },
    RasterDem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tiles: Option<Vec<String>>,
        /// TileJSON or protocol URL, used instead of `tiles`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(rename = "tileSize")]
        tile_size: u32,
        maxzoom: u8,
        encoding: DemEncoding,
    },
    Raster {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tiles: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(rename = "tileSize")]
        tile_size: u32,
    },
}

impl SourceSpec {
    /// First tile URL template, if the source lists tiles
    pub fn first_tile_url(&self) -> Option<&str> {
        let tiles = match self {
            SourceSpec::Vector { tiles, .. } => Some(tiles),
            SourceSpec::RasterDem { tiles, .. } | SourceSpec::Raster { tiles, .. } => tiles.as_ref(),
        };
        tiles.and_then(|t| t.first()).map(String::as_str)
    }

    pub fn encoding(&self) -> Option<DemEncoding> {
        match self {
            SourceSpec::RasterDem { encoding, .. } => Some(*encoding),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    Line,
    Symbol,
    Hillshade,
    ColorRelief,
    Raster,
    Background,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "source-layer", default, skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default)]
    pub paint: Map<String, Value>,
    #[serde(default)]
    pub layout: Map<String, Value>,
}

impl LayerSpec {
    pub fn new(id: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            kind,
            source: None,
            source_layer: None,
            filter: None,
            paint: Map::new(),
            layout: Map::new(),
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source_layer(mut self, source_layer: impl Into<String>) -> Self {
        self.source_layer = Some(source_layer.into());
        self
    }

    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn paint(mut self, name: &str, value: Value) -> Self {
        self.paint.insert(name.to_string(), value);
        self
    }

    pub fn layout(mut self, name: &str, value: Value) -> Self {
        self.layout.insert(name.to_string(), value);
        self
    }

    pub fn visible(self, visible: bool) -> Self {
        self.layout("visibility", visibility_value(visible))
    }

    /// Layers without an explicit `visibility` are visible
    pub fn is_visible(&self) -> bool {
        self.layout.get("visibility").and_then(Value::as_str) != Some("none")
    }
}

/// `layout.visibility` value for a flag
pub fn visibility_value(visible: bool) -> Value {
    Value::from(if visible { "visible" } else { "none" })
}
