use crate::core::geo::LatLngBounds;
use crate::prelude::HashMap;
use crate::surface::engine::MapEngine;
use crate::surface::spec::{LayerSpec, SourceSpec};
use crate::{Result, ViewerError};
use serde_json::Value;

/// Headless [`MapEngine`] keeping sources and layers in memory.
///
/// Enforces the same registration rules as a rendering engine, which makes
/// it the engine of choice for tests and for driving the pipeline without a
/// display.
pub struct InMemoryMap {
    sources: HashMap<String, SourceSpec>,
    layers: HashMap<String, LayerSpec>,
    /// Layer ids bottom to top
    render_order: Vec<String>,
    style_loaded: bool,
    bounds: LatLngBounds,
}

impl InMemoryMap {
    /// A map whose style has not loaded yet
    pub fn new(bounds: LatLngBounds) -> Self {
        Self {
            sources: HashMap::default(),
            layers: HashMap::default(),
            render_order: Vec::new(),
            style_loaded: false,
            bounds,
        }
    }

    /// A map with its style already loaded
    pub fn loaded(bounds: LatLngBounds) -> Self {
        let mut map = Self::new(bounds);
        map.style_loaded = true;
        map
    }

    pub fn set_style_loaded(&mut self, loaded: bool) {
        self.style_loaded = loaded;
    }

    /// Swaps the style: every source and layer is dropped and the new style
    /// starts loading.
    pub fn set_style(&mut self) {
        self.sources.clear();
        self.layers.clear();
        self.render_order.clear();
        self.style_loaded = false;
    }

    pub fn set_bounds(&mut self, bounds: LatLngBounds) {
        self.bounds = bounds;
    }

    pub fn source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.get(id)
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.get(id)
    }

    /// Layer ids bottom to top
    pub fn layer_ids(&self) -> &[String] {
        &self.render_order
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

impl MapEngine for InMemoryMap {
    fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<()> {
        if self.sources.contains_key(id) {
            return Err(ViewerError::SourceExists(id.to_string()));
        }
        self.sources.insert(id.to_string(), source);
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<()> {
        if !self.sources.contains_key(id) {
            return Err(ViewerError::UnknownSource(id.to_string()));
        }
        let dependent = self
            .render_order
            .iter()
            .find(|layer_id| {
                self.layers
                    .get(*layer_id)
                    .and_then(|layer| layer.source.as_deref())
                    == Some(id)
            });
        if let Some(layer_id) = dependent {
            return Err(ViewerError::SourceInUse {
                source_id: id.to_string(),
                layer_id: layer_id.clone(),
            });
        }
        self.sources.remove(id);
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    fn add_layer(&mut self, layer: LayerSpec, before_id: Option<&str>) -> Result<()> {
        if self.layers.contains_key(&layer.id) {
            return Err(ViewerError::LayerExists(layer.id));
        }
        if let Some(source) = layer.source.as_deref() {
            if !self.sources.contains_key(source) {
                return Err(ViewerError::UnknownSource(source.to_string()));
            }
        }

        let insert_pos = before_id
            .and_then(|before| self.render_order.iter().position(|id| id == before))
            .unwrap_or(self.render_order.len());
        self.render_order.insert(insert_pos, layer.id.clone());
        self.layers.insert(layer.id.clone(), layer);
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<()> {
        if self.layers.remove(id).is_none() {
            return Err(ViewerError::UnknownLayer(id.to_string()));
        }
        self.render_order.retain(|layer_id| layer_id != id);
        Ok(())
    }

    fn set_layout_property(&mut self, layer_id: &str, name: &str, value: Value) -> Result<()> {
        let layer = self
            .layers
            .get_mut(layer_id)
            .ok_or_else(|| ViewerError::UnknownLayer(layer_id.to_string()))?;
        layer.layout.insert(name.to_string(), value);
        Ok(())
    }

    fn bounds(&self) -> LatLngBounds {
        self.bounds.clone()
    }
}
