use crate::core::geo::LatLngBounds;
use crate::surface::spec::{LayerSpec, SourceSpec};
use crate::Result;
use serde_json::Value;

/// The slice of a map rendering engine the contour pipeline drives.
///
/// Calls are synchronous and made from the thread owning the map. Engines
/// reject adding an id twice and removing a source that layers still use.
pub trait MapEngine {
    /// Whether the current style finished loading and accepts sources/layers
    fn is_style_loaded(&self) -> bool;

    fn has_source(&self, id: &str) -> bool;

    fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<()>;

    fn remove_source(&mut self, id: &str) -> Result<()>;

    fn has_layer(&self, id: &str) -> bool;

    /// Adds `layer` below `before_id` when given, on top otherwise
    fn add_layer(&mut self, layer: LayerSpec, before_id: Option<&str>) -> Result<()>;

    fn remove_layer(&mut self, id: &str) -> Result<()>;

    fn set_layout_property(&mut self, layer_id: &str, name: &str, value: Value) -> Result<()>;

    /// Geographic extent of the current viewport
    fn bounds(&self) -> LatLngBounds;
}
