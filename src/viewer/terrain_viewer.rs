//! The primary map of the terrain viewer and its contour overlay.
//!
//! [`TerrainViewer`] is the single owner of everything the contour lifecycle
//! touches: the map, the shareable [`ViewerState`], the stored
//! [`ViewerSettings`] and the [`ContourInitializer`]. Map events, state
//! changes and timer ticks all come in through `&mut self`, so there is no
//! shared mutable state to guard.

use crate::contour::fetch::TileFetcher;
use crate::contour::handler::ContourGenerator;
use crate::contour::source::{ContourTileSource, DemSourceOptions};
use crate::core::config::{ContourLifecycleConfig, Theme, ViewerSettings};
use crate::core::constants::{
    CONTOUR_SOURCE_ID, CONTOUR_SOURCE_MAX_ZOOM, HILLSHADE_SOURCE_ID, RASTER_BASEMAP_SOURCE_ID,
    TERRAIN_SOURCE_ID,
};
use crate::core::geo::{tiles_covering, LatLngBounds, TileCoord};
use crate::lifecycle::initializer::{ContourInitializer, ContourSourceHandle};
use crate::lifecycle::state::InitState;
use crate::protocol::ProtocolRegistry;
use crate::surface::controller::MapSurfaceController;
use crate::surface::engine::MapEngine;
use crate::surface::spec::{LayerSpec, SourceSpec};
use crate::terrain::basemap::raster_basemap_source;
use crate::terrain::resolver::ElevationSourceResolver;
use crate::viewer::hillshade::hillshade_layer;
use crate::viewer::state::ViewerState;
use crate::Result;
use instant::Instant;
use std::sync::Arc;

/// Map lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEvent {
    /// The map finished its first load
    Load,
    StyleLoad,
    StyleData,
    SourceData,
    Data,
    Render,
    Idle,
}

pub struct TerrainViewer<M: MapEngine> {
    map: M,
    settings: ViewerSettings,
    state: ViewerState,
    registry: ProtocolRegistry,
    fetcher: Arc<dyn TileFetcher>,
    generator: Arc<dyn ContourGenerator>,
    surface: MapSurfaceController,
    initializer: ContourInitializer,
    map_loaded: bool,
}

impl<M: MapEngine> TerrainViewer<M> {
    /// Creates a viewer over `map`, registering contour protocols with the
    /// process-wide registry.
    pub fn new(
        map: M,
        settings: ViewerSettings,
        state: ViewerState,
        fetcher: Arc<dyn TileFetcher>,
        generator: Arc<dyn ContourGenerator>,
    ) -> Self {
        let surface = MapSurfaceController::new(state.contour_visibility(), settings.theme);
        Self {
            map,
            settings,
            state,
            registry: ProtocolRegistry::global(),
            fetcher,
            generator,
            surface,
            initializer: ContourInitializer::default(),
            map_loaded: false,
        }
    }

    /// Uses `registry` instead of the process-wide one
    pub fn with_registry(mut self, registry: ProtocolRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_lifecycle_config(mut self, config: ContourLifecycleConfig) -> Self {
        self.initializer = ContourInitializer::new(config);
        self
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ProtocolRegistry {
        &self.registry
    }

    pub fn init_state(&self) -> InitState {
        self.initializer.state()
    }

    pub fn initializer(&self) -> &ContourInitializer {
        &self.initializer
    }

    pub fn contour_handle(&self) -> Option<&ContourSourceHandle> {
        self.initializer.handle()
    }

    /// When [`tick`](Self::tick) next has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.initializer.next_deadline()
    }

    /// Every map event funnels into the same reconciliation
    pub fn handle_event(&mut self, event: MapEvent, now: Instant) {
        if event == MapEvent::Load {
            log::debug!("[contours] map loaded");
            self.map_loaded = true;
        }
        self.reconcile(now);
    }

    /// Applies a new viewer state, doing as little as the change needs:
    /// another terrain source restarts setup, new intervals rebuild the
    /// contour source, visibility toggles flip layer layout in place.
    pub fn apply_state(&mut self, state: ViewerState, now: Instant) -> Result<()> {
        let previous = std::mem::replace(&mut self.state, state);

        if previous.source_a != self.state.source_a {
            log::info!(
                "[contours] terrain source changed: {} -> {}",
                previous.source_a,
                self.state.source_a
            );
            if self.map_loaded {
                self.restart(now);
            }
        } else if self.state.intervals_changed(&previous) {
            self.rebuild(now);
        }

        let visibility = self.state.contour_visibility();
        if visibility != previous.contour_visibility() {
            self.surface.set_visibility(&mut self.map, visibility)?;
        }
        Ok(())
    }

    /// Replaces the stored settings. Setup restarts when the terrain source
    /// now resolves differently (new API key, endpoint or custom source).
    pub fn set_settings(&mut self, settings: ViewerSettings, now: Instant) -> Result<()> {
        let key = self.state.source_a.clone();
        let before = ElevationSourceResolver::new(&self.settings).resolve(&key);
        let after = ElevationSourceResolver::new(&settings).resolve(&key);
        let theme = settings.theme;
        self.settings = settings;

        if before != after && self.map_loaded {
            log::info!("[contours] elevation source for {} changed, restarting", key);
            self.restart(now);
        }
        self.surface.set_theme(&mut self.map, theme)
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.settings.theme = theme;
        self.surface.set_theme(&mut self.map, theme)
    }

    /// Runs the pending setup attempt if it is due. Returns whether an
    /// attempt ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.initializer.take_due(now).is_none() {
            return false;
        }
        if !self.initializer.begin_attempt() {
            return false;
        }
        if !self.map.is_style_loaded() {
            self.initializer.style_not_ready(now);
            return true;
        }

        match self.setup_contours() {
            Ok(handle) => {
                if let Some(previous) = self.initializer.succeeded(handle) {
                    self.release(&previous);
                }
            }
            Err(err) => self.initializer.failed(now, &err),
        }
        true
    }

    /// Geographic extent of the current viewport
    pub fn bounds(&self) -> LatLngBounds {
        self.surface.bounds(&self.map)
    }

    /// Shareable query string for the current state
    pub fn query_string(&self) -> Result<String> {
        self.state.to_query_string()
    }

    /// Sources under the contours for the current state: terrain and
    /// hillshade DEMs for the primary terrain source, plus the raster basemap
    /// when it is shown
    pub fn base_sources(&self) -> Vec<(&'static str, SourceSpec)> {
        let resolver = ElevationSourceResolver::new(&self.settings);
        let mut sources = Vec::new();
        if let Some(dem) = resolver.raster_dem_source(&self.state.source_a) {
            sources.push((TERRAIN_SOURCE_ID, dem.clone()));
            sources.push((HILLSHADE_SOURCE_ID, dem));
        }
        if self.state.show_raster_basemap {
            sources.push((
                RASTER_BASEMAP_SOURCE_ID,
                raster_basemap_source(&self.settings, &self.state.basemap_source),
            ));
        }
        sources
    }

    /// Hillshade layer styled from the current state
    pub fn hillshade_layer(&self) -> LayerSpec {
        hillshade_layer(&self.state)
    }

    /// Contour tile URLs covering the viewport at `zoom`
    pub fn visible_contour_tiles(&self, zoom: u8) -> Vec<String> {
        let Some(handle) = self.initializer.handle() else {
            return Vec::new();
        };
        let zoom = zoom.min(CONTOUR_SOURCE_MAX_ZOOM);
        tiles_covering(&self.bounds(), zoom)
            .iter()
            .map(|coord: &TileCoord| coord.fill_template(&handle.protocol_url))
            .collect()
    }

    /// Requests every contour tile covering the viewport at `zoom` through
    /// the protocol registry, concurrently
    pub async fn prefetch_contours(&self, zoom: u8) -> Vec<Result<Vec<u8>>> {
        let urls = self.visible_contour_tiles(zoom);
        log::debug!("[contours] prefetching {} tiles at z{}", urls.len(), zoom);
        futures::future::join_all(urls.iter().map(|url| self.registry.request(url))).await
    }

    /// Detaches from the map: pending work is dropped and the contour source
    /// and protocol are removed. Later calls do nothing.
    pub fn dispose(&mut self) {
        if let Some(handle) = self.initializer.dispose() {
            self.teardown(&handle);
        }
    }

    fn reconcile(&mut self, now: Instant) {
        if !self.map_loaded || self.initializer.is_disposed() {
            return;
        }
        if self.initializer.terrain_key() != Some(self.state.source_a.as_str()) {
            self.restart(now);
            return;
        }
        if self.initializer.state() == InitState::Ready && !self.map.has_source(CONTOUR_SOURCE_ID)
        {
            log::warn!("[contours] contour source disappeared from the style, reinitializing");
            self.restart(now);
            return;
        }
        self.initializer.nudge(now);
    }

    fn restart(&mut self, now: Instant) {
        let key = self.state.source_a.clone();
        if let Some(previous) = self.initializer.terrain_source_changed(&key, now) {
            self.teardown(&previous);
        }
    }

    /// Re-registers the live contour source with the current intervals.
    ///
    /// Runs whenever a contour source exists, including after setup gave up.
    /// Intervals that cannot form a table leave the map untouched.
    fn rebuild(&mut self, now: Instant) {
        if self.initializer.is_disposed() {
            return;
        }
        // Without a live source, the pending attempt reads the intervals
        let Some(tile_source) = self.initializer.handle().map(|h| h.tile_source.clone()) else {
            return;
        };

        let table = match self.state.threshold_table() {
            Ok(table) => table,
            Err(err) => {
                log::warn!("[contours] keeping current contours: {}", err);
                return;
            }
        };
        // A failed retry in between may have unregistered it
        tile_source.setup_protocol(&self.registry);
        match self
            .surface
            .add_or_replace_contour_source(&mut self.map, &tile_source, &table)
        {
            Ok(url) => {
                log::debug!("[contours] rebuilt with {}", table.encode());
                self.initializer.rebuilt(table, url);
            }
            Err(err) => self.initializer.failed(now, &err),
        }
    }

    fn setup_contours(&mut self) -> Result<ContourSourceHandle> {
        let terrain_key = self.state.source_a.clone();
        let resolved = ElevationSourceResolver::new(&self.settings).resolve(&terrain_key);
        let thresholds = self.state.threshold_table()?;

        let tile_source = Arc::new(ContourTileSource::new(
            DemSourceOptions::from_resolved(&resolved),
            self.fetcher.clone(),
            self.generator.clone(),
        ));
        tile_source.setup_protocol(&self.registry);

        let protocol_url = match self
            .surface
            .add_or_replace_contour_source(&mut self.map, &tile_source, &thresholds)
        {
            Ok(url) => url,
            Err(err) => {
                tile_source.remove_protocol(&self.registry);
                return Err(err);
            }
        };

        Ok(ContourSourceHandle {
            terrain_key,
            tile_source,
            thresholds,
            protocol_url,
        })
    }

    fn teardown(&mut self, handle: &ContourSourceHandle) {
        if let Err(err) = self.surface.remove_contour_source(&mut self.map) {
            log::warn!("[contours] failed to remove contour source: {}", err);
        }
        self.release(handle);
    }

    fn release(&self, handle: &ContourSourceHandle) {
        if handle.tile_source.remove_protocol(&self.registry) {
            log::debug!(
                "[contours] unregistered {}",
                handle.tile_source.contour_protocol_id()
            );
        }
    }
}
