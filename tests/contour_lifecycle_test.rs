use async_trait::async_trait;
use relief::constants::{CONTOUR_LABELS_LAYER_ID, CONTOUR_LINES_LAYER_ID, CONTOUR_SOURCE_ID};
use relief::prelude::*;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

/// Lifecycle tests driving a [`TerrainViewer`] through map events, state
/// changes and timer ticks
#[cfg(test)]
mod contour_lifecycle_tests {
    use super::*;

    struct NoFetch;

    #[async_trait]
    impl TileFetcher for NoFetch {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            Err(ViewerError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
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

    /// In-memory map whose source registration can be made to fail
    struct FlakyMap {
        inner: InMemoryMap,
        fail_adds: Arc<AtomicBool>,
    }

    impl MapEngine for FlakyMap {
        fn is_style_loaded(&self) -> bool {
            self.inner.is_style_loaded()
        }

        fn has_source(&self, id: &str) -> bool {
            self.inner.has_source(id)
        }

        fn add_source(&mut self, id: &str, source: SourceSpec) -> Result<()> {
            if self.fail_adds.load(Ordering::SeqCst) {
                return Err(ViewerError::SourceExists(id.to_string()));
            }
            self.inner.add_source(id, source)
        }

        fn remove_source(&mut self, id: &str) -> Result<()> {
            self.inner.remove_source(id)
        }

        fn has_layer(&self, id: &str) -> bool {
            self.inner.has_layer(id)
        }

        fn add_layer(&mut self, layer: LayerSpec, before_id: Option<&str>) -> Result<()> {
            self.inner.add_layer(layer, before_id)
        }

        fn remove_layer(&mut self, id: &str) -> Result<()> {
            self.inner.remove_layer(id)
        }

        fn set_layout_property(&mut self, layer_id: &str, name: &str, value: Value) -> Result<()> {
            self.inner.set_layout_property(layer_id, name, value)
        }

        fn bounds(&self) -> LatLngBounds {
            self.inner.bounds()
        }
    }

    fn matterhorn() -> LatLngBounds {
        LatLngBounds::from_coords(45.9, 7.5, 46.1, 7.8)
    }

    fn state() -> ViewerState {
        ViewerState {
            show_contours_and_graticules: true,
            ..Default::default()
        }
    }

    fn settings_with_cog() -> ViewerSettings {
        ViewerSettings {
            custom_terrain_sources: vec![CustomTerrainSource::new(
                "custom-cog",
                "Swiss DEM",
                "https://data.example.com/dem.tif",
                CustomSourceType::Cog,
            )],
            ..Default::default()
        }
    }

    fn viewer_with<M: MapEngine>(map: M, settings: ViewerSettings) -> TerrainViewer<M> {
        TerrainViewer::new(map, settings, state(), Arc::new(NoFetch), Arc::new(NoContours))
            .with_registry(ProtocolRegistry::new())
    }

    fn loaded_viewer(settings: ViewerSettings) -> (TerrainViewer<InMemoryMap>, Instant) {
        let t0 = Instant::now();
        let mut viewer = viewer_with(InMemoryMap::loaded(matterhorn()), settings);
        viewer.handle_event(MapEvent::Load, t0);
        assert!(viewer.tick(t0 + Duration::from_secs(1)));
        assert_eq!(viewer.init_state(), InitState::Ready);
        (viewer, t0 + Duration::from_secs(1))
    }

    fn registered_thresholds(map: &InMemoryMap) -> String {
        let url = map
            .source(CONTOUR_SOURCE_ID)
            .and_then(|source| source.first_tile_url())
            .expect("contour source registered");
        let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
        ContourTileOptions::decode_query(query)
            .expect("valid contour query")
            .thresholds
            .encode()
    }

    /// Default mapterhorn source with 50/200 m intervals
    #[test]
    fn test_mapterhorn_scenario() {
        let (viewer, _) = loaded_viewer(ViewerSettings::default());

        let handle = viewer.contour_handle().expect("contour handle");
        assert_eq!(handle.terrain_key, "mapterhorn");
        assert_eq!(handle.tile_source.options().encoding, DemEncoding::Terrarium);
        assert_eq!(
            handle.tile_source.options().url,
            "https://tiles.mapterhorn.com/{z}/{x}/{y}.webp"
        );
        assert_eq!(
            registered_thresholds(viewer.map()),
            "11*200*1000~12*50*200~14*25*200~15*10*50"
        );

        assert_eq!(viewer.map().source_count(), 1);
        assert_eq!(
            viewer.map().layer_ids(),
            [CONTOUR_LINES_LAYER_ID, CONTOUR_LABELS_LAYER_ID]
        );
        assert_eq!(
            viewer.map().source(CONTOUR_SOURCE_ID),
            Some(&SourceSpec::Vector {
                tiles: vec![handle.protocol_url.clone()],
                maxzoom: 15,
            })
        );
    }

    /// Switching to a custom COG tears the contour source down and rebuilds it
    /// with mapbox encoding behind TiTiler
    #[test]
    fn test_switch_to_custom_cog_rebuilds() {
        let (mut viewer, now) = loaded_viewer(settings_with_cog());
        let before = viewer.contour_handle().expect("handle").tile_source.clone();

        let cog_state = ViewerState {
            source_a: "custom-cog".to_string(),
            ..state()
        };
        viewer.apply_state(cog_state, now).unwrap();

        // Torn down immediately, rebuilt after the settle delay
        assert!(!viewer.map().has_source(CONTOUR_SOURCE_ID));
        assert_eq!(viewer.map().layer_count(), 0);
        assert_eq!(viewer.init_state(), InitState::Uninitialized);
        assert_eq!(viewer.initializer().attempts(), 0);

        assert!(viewer.tick(now + Duration::from_secs(1)));
        assert_eq!(viewer.init_state(), InitState::Ready);

        let handle = viewer.contour_handle().expect("rebuilt handle");
        assert!(!Arc::ptr_eq(&before, &handle.tile_source));
        assert_eq!(handle.terrain_key, "custom-cog");
        assert_eq!(handle.tile_source.options().encoding, DemEncoding::Mapbox);
        assert!(handle
            .tile_source
            .options()
            .url
            .starts_with("https://titiler.xyz/cog/tiles/WebMercatorQuad/{z}/{x}/{y}.png?"));
        assert_eq!(viewer.map().source_count(), 1);
        assert_eq!(viewer.map().layer_count(), 2);
        assert!(viewer.registry().has_protocol("dem-contour"));
    }

    /// New intervals replace the source in place without resetting the counter
    #[test]
    fn test_interval_change_rebuilds_in_place() {
        let (mut viewer, now) = loaded_viewer(ViewerSettings::default());
        let tile_source = viewer.contour_handle().unwrap().tile_source.clone();

        let coarser = ViewerState {
            contour_minor: 100.0,
            contour_major: 500.0,
            ..state()
        };
        viewer.apply_state(coarser, now).unwrap();

        assert_eq!(viewer.init_state(), InitState::Ready);
        assert_eq!(viewer.initializer().attempts(), 1);
        assert_eq!(
            registered_thresholds(viewer.map()),
            "11*500*2500~12*100*500~14*50*500~15*20*100"
        );
        let handle = viewer.contour_handle().unwrap();
        assert!(Arc::ptr_eq(&tile_source, &handle.tile_source));
        assert_eq!(handle.thresholds.get(12), Some((100.0, 500.0)));
        assert_eq!(viewer.map().source_count(), 1);
        assert_eq!(viewer.map().layer_count(), 2);
    }

    fn coarser() -> ViewerState {
        ViewerState {
            contour_minor: 100.0,
            contour_major: 500.0,
            ..state()
        }
    }

    const COARSER_THRESHOLDS: &str = "11*500*2500~12*100*500~14*50*500~15*20*100";

    /// Ready viewer on a map whose source registration can be broken later
    fn ready_flaky_viewer() -> (TerrainViewer<FlakyMap>, Arc<AtomicBool>, Instant) {
        let fail_adds = Arc::new(AtomicBool::new(false));
        let map = FlakyMap {
            inner: InMemoryMap::loaded(matterhorn()),
            fail_adds: fail_adds.clone(),
        };
        let mut viewer = viewer_with(map, ViewerSettings::default());
        let t0 = Instant::now();
        viewer.handle_event(MapEvent::Load, t0);
        let now = t0 + Duration::from_secs(1);
        assert!(viewer.tick(now));
        assert_eq!(viewer.init_state(), InitState::Ready);
        (viewer, fail_adds, now)
    }

    /// A rebuild the map rejects is a failed attempt, retried with the new
    /// intervals
    #[test]
    fn test_failed_rebuild_is_retried() {
        let (mut viewer, fail_adds, now) = ready_flaky_viewer();

        fail_adds.store(true, Ordering::SeqCst);
        viewer.apply_state(coarser(), now).unwrap();
        assert_eq!(viewer.init_state(), InitState::Attempting);
        assert_eq!(
            viewer.initializer().pending_reason(),
            Some(AttemptReason::Retry)
        );
        assert_eq!(viewer.next_deadline(), Some(now + Duration::from_secs(2)));

        fail_adds.store(false, Ordering::SeqCst);
        assert!(!viewer.tick(now + Duration::from_millis(1999)));
        assert!(viewer.tick(now + Duration::from_secs(2)));

        assert_eq!(viewer.init_state(), InitState::Ready);
        assert_eq!(viewer.initializer().attempts(), 2);
        assert_eq!(registered_thresholds(&viewer.map().inner), COARSER_THRESHOLDS);
        assert_eq!(
            viewer.contour_handle().unwrap().thresholds.get(12),
            Some((100.0, 500.0))
        );
        assert!(viewer.registry().has_protocol("dem-contour"));
    }

    /// Unusable intervals keep the current contours and cost no attempts
    #[test]
    fn test_transient_invalid_intervals() {
        let (mut viewer, now) = loaded_viewer(ViewerSettings::default());

        let broken = ViewerState {
            contour_minor: 0.0,
            ..state()
        };
        viewer.apply_state(broken, now).unwrap();
        assert_eq!(viewer.init_state(), InitState::Ready);
        assert_eq!(viewer.next_deadline(), None);
        assert!(!viewer.tick(now + Duration::from_secs(30)));
        assert_eq!(viewer.initializer().attempts(), 1);
        assert_eq!(
            registered_thresholds(viewer.map()),
            "11*200*1000~12*50*200~14*25*200~15*10*50"
        );

        viewer
            .apply_state(coarser(), now + Duration::from_secs(30))
            .unwrap();
        assert_eq!(viewer.init_state(), InitState::Ready);
        assert_eq!(registered_thresholds(viewer.map()), COARSER_THRESHOLDS);
    }

    /// Once setup gave up, new intervals still rebuild the live source
    #[test]
    fn test_interval_change_recovers_exhausted_setup() {
        let (mut viewer, fail_adds, mut now) = ready_flaky_viewer();

        fail_adds.store(true, Ordering::SeqCst);
        viewer.apply_state(coarser(), now).unwrap();
        for _ in 0..10 {
            now += Duration::from_secs(3);
            viewer.tick(now);
        }
        assert_eq!(viewer.init_state(), InitState::Exhausted);
        assert!(viewer.contour_handle().is_some());
        assert!(!viewer.map().has_source(CONTOUR_SOURCE_ID));

        fail_adds.store(false, Ordering::SeqCst);
        let finer = ViewerState {
            contour_minor: 20.0,
            contour_major: 100.0,
            ..state()
        };
        viewer.apply_state(finer, now).unwrap();

        assert_eq!(viewer.init_state(), InitState::Ready);
        assert_eq!(viewer.next_deadline(), None);
        assert_eq!(
            registered_thresholds(&viewer.map().inner),
            "11*100*500~12*20*100~14*10*100~15*4*20"
        );
        assert!(viewer.registry().has_protocol("dem-contour"));
    }

    /// Five failed attempts stop automatic setup until the terrain changes
    #[test]
    fn test_exhaustion_and_recovery() {
        let fail_adds = Arc::new(AtomicBool::new(true));
        let map = FlakyMap {
            inner: InMemoryMap::loaded(matterhorn()),
            fail_adds: fail_adds.clone(),
        };
        let mut viewer = viewer_with(map, ViewerSettings::default());

        let mut now = Instant::now();
        viewer.handle_event(MapEvent::Load, now);

        let mut attempts = 0;
        for _ in 0..20 {
            now += Duration::from_secs(3);
            viewer.handle_event(MapEvent::Idle, now);
            if viewer.tick(now) {
                attempts += 1;
            }
        }
        assert_eq!(attempts, 5, "exactly five attempts before giving up");
        assert_eq!(viewer.init_state(), InitState::Exhausted);
        assert_eq!(viewer.next_deadline(), None);
        assert!(
            !viewer.registry().has_protocol("dem-contour"),
            "failed attempts leave no protocol behind"
        );

        // The map recovers, but nothing retries on its own
        fail_adds.store(false, Ordering::SeqCst);
        now += Duration::from_secs(60);
        viewer.handle_event(MapEvent::StyleData, now);
        assert!(!viewer.tick(now + Duration::from_secs(60)));

        // A terrain change resets the counter
        let aws = ViewerState {
            source_a: "aws".to_string(),
            ..state()
        };
        viewer.apply_state(aws, now).unwrap();
        assert_eq!(viewer.initializer().attempts(), 0);
        assert_eq!(viewer.init_state(), InitState::Uninitialized);

        assert!(viewer.tick(now + Duration::from_secs(1)));
        assert_eq!(viewer.init_state(), InitState::Ready);
        assert_eq!(viewer.initializer().attempts(), 1);
        assert_eq!(viewer.contour_handle().unwrap().terrain_key, "aws");
    }

    /// Attempts wait for the style and re-check it after the settle delay
    #[test]
    fn test_waits_for_style() {
        let t0 = Instant::now();
        let mut viewer = viewer_with(InMemoryMap::new(matterhorn()), ViewerSettings::default());
        viewer.handle_event(MapEvent::Load, t0);

        assert!(viewer.tick(t0 + Duration::from_secs(1)));
        assert_eq!(viewer.init_state(), InitState::Attempting);
        assert_eq!(
            viewer.initializer().pending_reason(),
            Some(AttemptReason::StyleRecheck)
        );
        assert!(!viewer.map().has_source(CONTOUR_SOURCE_ID));

        viewer.map_mut().set_style_loaded(true);
        viewer.handle_event(MapEvent::StyleLoad, t0 + Duration::from_millis(1500));
        assert!(viewer.tick(t0 + Duration::from_secs(2)));
        assert_eq!(viewer.init_state(), InitState::Ready);
        assert_eq!(viewer.initializer().attempts(), 2);
    }

    /// A burst of map events schedules a single attempt
    #[test]
    fn test_event_burst_collapses() {
        let t0 = Instant::now();
        let mut viewer = viewer_with(InMemoryMap::loaded(matterhorn()), ViewerSettings::default());
        viewer.handle_event(MapEvent::Load, t0);
        let deadline = viewer.next_deadline();

        for (i, event) in [
            MapEvent::StyleData,
            MapEvent::SourceData,
            MapEvent::Render,
            MapEvent::Data,
            MapEvent::Render,
        ]
        .into_iter()
        .enumerate()
        {
            viewer.handle_event(event, t0 + Duration::from_millis(100 * i as u64));
        }
        assert_eq!(viewer.next_deadline(), deadline);

        assert!(viewer.tick(t0 + Duration::from_secs(1)));
        assert!(!viewer.tick(t0 + Duration::from_secs(2)));
        assert_eq!(viewer.initializer().attempts(), 1);
    }

    /// A style swap drops the contour source; the next event restores it
    #[test]
    fn test_style_swap_restores_contours() {
        let (mut viewer, now) = loaded_viewer(ViewerSettings::default());

        viewer.map_mut().set_style();
        viewer.handle_event(MapEvent::StyleData, now);
        assert_eq!(viewer.init_state(), InitState::Uninitialized);

        viewer.map_mut().set_style_loaded(true);
        viewer.handle_event(MapEvent::StyleLoad, now + Duration::from_millis(200));
        assert!(viewer.tick(now + Duration::from_secs(1)));
        assert_eq!(viewer.init_state(), InitState::Ready);
        assert!(viewer.map().has_source(CONTOUR_SOURCE_ID));
        assert_eq!(viewer.map().layer_count(), 2);
    }

    /// Toggling contours only changes layer layout
    #[test]
    fn test_visibility_toggles_in_place() {
        let (mut viewer, now) = loaded_viewer(ViewerSettings::default());
        let url = viewer.contour_handle().unwrap().protocol_url.clone();

        let hidden = ViewerState {
            show_contours_and_graticules: false,
            ..state()
        };
        viewer.apply_state(hidden, now).unwrap();
        assert!(!viewer.map().layer(CONTOUR_LINES_LAYER_ID).unwrap().is_visible());
        assert!(!viewer.map().layer(CONTOUR_LABELS_LAYER_ID).unwrap().is_visible());
        assert!(viewer.map().has_source(CONTOUR_SOURCE_ID));

        viewer.apply_state(state(), now).unwrap();
        assert!(viewer.map().layer(CONTOUR_LINES_LAYER_ID).unwrap().is_visible());
        assert_eq!(viewer.contour_handle().unwrap().protocol_url, url);
        assert_eq!(viewer.initializer().attempts(), 1);
    }

    /// A new API key changes the resolved URL and restarts setup
    #[test]
    fn test_settings_change_restarts() {
        let t0 = Instant::now();
        let mut viewer = viewer_with(InMemoryMap::loaded(matterhorn()), ViewerSettings::default());
        viewer
            .apply_state(
                ViewerState {
                    source_a: "maptiler".to_string(),
                    ..state()
                },
                t0,
            )
            .unwrap();
        viewer.handle_event(MapEvent::Load, t0);
        viewer.tick(t0 + Duration::from_secs(1));
        assert!(viewer
            .contour_handle()
            .unwrap()
            .tile_source
            .options()
            .url
            .ends_with("key="));

        let now = t0 + Duration::from_secs(2);
        let settings = ViewerSettings {
            maptiler_key: "abc123".to_string(),
            ..Default::default()
        };
        viewer.set_settings(settings.clone(), now).unwrap();
        assert_eq!(viewer.init_state(), InitState::Uninitialized);
        viewer.tick(now + Duration::from_secs(1));
        assert!(viewer
            .contour_handle()
            .unwrap()
            .tile_source
            .options()
            .url
            .ends_with("key=abc123"));

        // Same resolution: nothing to do
        viewer.set_settings(settings, now + Duration::from_secs(2)).unwrap();
        assert_eq!(viewer.init_state(), InitState::Ready);
    }

    #[test]
    fn test_theme_restyles_layers() {
        let (mut viewer, _) = loaded_viewer(ViewerSettings::default());
        viewer.set_theme(Theme::Dark).unwrap();
        let labels = viewer.map().layer(CONTOUR_LABELS_LAYER_ID).unwrap();
        assert_eq!(labels.paint["text-color"], "#ffffff");
        assert_eq!(viewer.settings().theme, Theme::Dark);
    }

    #[test]
    fn test_bounds_and_query_string() {
        let (viewer, _) = loaded_viewer(ViewerSettings::default());
        assert_eq!(viewer.bounds(), matterhorn());
        assert_eq!(
            viewer.query_string().unwrap(),
            "showContoursAndGraticules=true"
        );
    }
}
