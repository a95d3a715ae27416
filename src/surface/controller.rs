//! Registration of the contour source and its layers on a map.

use crate::contour::layers::{contour_labels_layer, contour_lines_layer};
use crate::contour::options::ContourTileOptions;
use crate::contour::source::ContourTileSource;
use crate::contour::thresholds::ContourThresholdTable;
use crate::core::config::Theme;
use crate::core::constants::{
    CONTOUR_LABELS_LAYER_ID, CONTOUR_LINES_LAYER_ID, CONTOUR_SOURCE_ID, CONTOUR_SOURCE_MAX_ZOOM,
};
use crate::core::geo::LatLngBounds;
use crate::surface::engine::MapEngine;
use crate::surface::spec::{visibility_value, SourceSpec};
use crate::Result;

/// Which contour layers are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContourVisibility {
    pub lines: bool,
    pub labels: bool,
}

impl Default for ContourVisibility {
    fn default() -> Self {
        Self {
            lines: true,
            labels: true,
        }
    }
}

/// Owns the contour source and layers on a [`MapEngine`].
///
/// Remembers the visibility flags and theme so a rebuilt source comes back
/// looking the way it was left.
#[derive(Debug, Clone)]
pub struct MapSurfaceController {
    visibility: ContourVisibility,
    theme: Theme,
}

impl MapSurfaceController {
    pub fn new(visibility: ContourVisibility, theme: Theme) -> Self {
        Self { visibility, theme }
    }

    pub fn visibility(&self) -> ContourVisibility {
        self.visibility
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Registers the contour source for `thresholds`, tearing down any
    /// previous one first. Layers go before their source; engines refuse to
    /// drop a source that still has layers. Returns the tile URL template
    /// the new source uses.
    pub fn add_or_replace_contour_source<M: MapEngine + ?Sized>(
        &self,
        map: &mut M,
        tile_source: &ContourTileSource,
        thresholds: &ContourThresholdTable,
    ) -> Result<String> {
        if self.remove_contour_source(map)? {
            log::debug!("[contours] removed existing source");
        }

        let url = tile_source.contour_protocol_url(&ContourTileOptions::new(thresholds.clone()));
        map.add_source(
            CONTOUR_SOURCE_ID,
            SourceSpec::Vector {
                tiles: vec![url.clone()],
                maxzoom: CONTOUR_SOURCE_MAX_ZOOM,
            },
        )?;
        map.add_layer(contour_lines_layer(self.visibility.lines, self.theme), None)?;
        map.add_layer(contour_labels_layer(self.visibility.labels, self.theme), None)?;
        Ok(url)
    }

    /// Removes both contour layers (whichever exist) and then the source.
    /// Returns whether a source was removed.
    pub fn remove_contour_source<M: MapEngine + ?Sized>(&self, map: &mut M) -> Result<bool> {
        for layer_id in [CONTOUR_LINES_LAYER_ID, CONTOUR_LABELS_LAYER_ID] {
            if map.has_layer(layer_id) {
                map.remove_layer(layer_id)?;
            }
        }
        if !map.has_source(CONTOUR_SOURCE_ID) {
            return Ok(false);
        }
        map.remove_source(CONTOUR_SOURCE_ID)?;
        Ok(true)
    }

    /// Shows or hides the contour layers in place, without touching the source
    pub fn set_visibility<M: MapEngine + ?Sized>(
        &mut self,
        map: &mut M,
        visibility: ContourVisibility,
    ) -> Result<()> {
        self.visibility = visibility;
        for (layer_id, visible) in [
            (CONTOUR_LINES_LAYER_ID, visibility.lines),
            (CONTOUR_LABELS_LAYER_ID, visibility.labels),
        ] {
            if map.has_layer(layer_id) {
                map.set_layout_property(layer_id, "visibility", visibility_value(visible))?;
            }
        }
        Ok(())
    }

    /// Re-adds the contour layers with the colors of `theme`
    pub fn set_theme<M: MapEngine + ?Sized>(&mut self, map: &mut M, theme: Theme) -> Result<()> {
        if self.theme == theme {
            return Ok(());
        }
        self.theme = theme;
        if !map.has_source(CONTOUR_SOURCE_ID) {
            return Ok(());
        }
        for layer_id in [CONTOUR_LINES_LAYER_ID, CONTOUR_LABELS_LAYER_ID] {
            if map.has_layer(layer_id) {
                map.remove_layer(layer_id)?;
            }
        }
        map.add_layer(contour_lines_layer(self.visibility.lines, theme), None)?;
        map.add_layer(contour_labels_layer(self.visibility.labels, theme), None)?;
        Ok(())
    }

    /// Geographic extent of the map's current viewport
    pub fn bounds<M: MapEngine + ?Sized>(&self, map: &M) -> LatLngBounds {
        map.bounds()
    }
}

impl Default for MapSurfaceController {
    fn default() -> Self {
        Self::new(ContourVisibility::default(), Theme::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::fetch::TileFetcher;
    use crate::contour::handler::{ContourGenerator, DemTile};
    use crate::contour::source::DemSourceOptions;
    use crate::core::geo::TileCoord;
    use crate::surface::memory::InMemoryMap;
    use crate::terrain::encoding::DemEncoding;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct NoFetch;

    #[async_trait]
    impl TileFetcher for NoFetch {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            Err(crate::ViewerError::HttpStatus { status: 404, url: url.to_string() })
        }
    }

    struct NoContours;

    impl ContourGenerator for NoContours {
        fn generate(
            &self,
            _dem: &DemTile,
            _target: TileCoord,
            _intervals: (f64, f64),
            _options: &ContourTileOptions,
        ) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn tile_source() -> ContourTileSource {
        ContourTileSource::new(
            DemSourceOptions::new("https://tiles.mapterhorn.com/{z}/{x}/{y}.webp", DemEncoding::Terrarium, 14),
            Arc::new(NoFetch),
            Arc::new(NoContours),
        )
    }

    fn map() -> InMemoryMap {
        InMemoryMap::loaded(LatLngBounds::from_coords(45.9, 7.5, 46.1, 7.8))
    }

    #[test]
    fn test_add_or_replace_is_idempotent() {
        let mut map = map();
        let controller = MapSurfaceController::default();
        let source = tile_source();
        let table = ContourThresholdTable::from_intervals(50.0, 200.0).unwrap();

        let first = controller.add_or_replace_contour_source(&mut map, &source, &table).unwrap();
        let second = controller.add_or_replace_contour_source(&mut map, &source, &table).unwrap();

        assert_eq!(first, second);
        assert_eq!(map.source_count(), 1);
        assert_eq!(map.layer_ids(), [CONTOUR_LINES_LAYER_ID, CONTOUR_LABELS_LAYER_ID]);
        assert_eq!(
            map.source(CONTOUR_SOURCE_ID).and_then(|s| s.first_tile_url()),
            Some(first.as_str())
        );
    }

    #[test]
    fn test_replace_reapplies_visibility() {
        let mut map = map();
        let mut controller = MapSurfaceController::default();
        let source = tile_source();
        let table = ContourThresholdTable::from_intervals(50.0, 200.0).unwrap();

        controller.add_or_replace_contour_source(&mut map, &source, &table).unwrap();
        controller
            .set_visibility(&mut map, ContourVisibility { lines: true, labels: false })
            .unwrap();
        assert!(!map.layer(CONTOUR_LABELS_LAYER_ID).unwrap().is_visible());

        let coarser = ContourThresholdTable::from_intervals(100.0, 500.0).unwrap();
        let url = controller.add_or_replace_contour_source(&mut map, &source, &coarser).unwrap();
        assert!(url.contains("thresholds=11*500*2500"));
        assert!(map.layer(CONTOUR_LINES_LAYER_ID).unwrap().is_visible());
        assert!(!map.layer(CONTOUR_LABELS_LAYER_ID).unwrap().is_visible());
    }

    #[test]
    fn test_replace_recovers_from_dangling_layer() {
        let mut map = map();
        let controller = MapSurfaceController::default();
        let source = tile_source();
        let table = ContourThresholdTable::from_intervals(50.0, 200.0).unwrap();

        controller.add_or_replace_contour_source(&mut map, &source, &table).unwrap();
        map.remove_layer(CONTOUR_LINES_LAYER_ID).unwrap();

        controller.add_or_replace_contour_source(&mut map, &source, &table).unwrap();
        assert_eq!(map.layer_count(), 2);
        assert_eq!(map.source_count(), 1);
    }

    #[test]
    fn test_teardown_and_theme() {
        let mut map = map();
        let mut controller = MapSurfaceController::default();
        let source = tile_source();
        let table = ContourThresholdTable::from_intervals(50.0, 200.0).unwrap();

        // Theme change without a source is only remembered
        controller.set_theme(&mut map, Theme::Dark).unwrap();
        assert_eq!(map.layer_count(), 0);

        controller.add_or_replace_contour_source(&mut map, &source, &table).unwrap();
        assert_eq!(map.layer(CONTOUR_LABELS_LAYER_ID).unwrap().paint["text-color"], "#ffffff");

        controller.set_theme(&mut map, Theme::Light).unwrap();
        assert_eq!(map.layer(CONTOUR_LABELS_LAYER_ID).unwrap().paint["text-color"], "#000000");
        assert_eq!(map.source_count(), 1);

        assert!(controller.remove_contour_source(&mut map).unwrap());
        assert!(!controller.remove_contour_source(&mut map).unwrap());
        assert_eq!(map.layer_count(), 0);
    }
}
