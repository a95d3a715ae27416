//! Drives the contour lifecycle against an in-memory map: load, settle,
//! change intervals, switch terrain and prefetch the tiles in view.
//!
//! DEM tiles come from a synthetic fetcher, so no network access is needed.

use async_trait::async_trait;
use relief::prelude::*;

/// Serves a fixed-size blank DEM tile for every URL
struct BlankDem;

#[async_trait]
impl TileFetcher for BlankDem {
    async fn fetch(&self, _url: &str) -> relief::Result<Vec<u8>> {
        Ok(vec![0; 256 * 256 * 4])
    }
}

/// Reports what it was asked for instead of tracing contours
struct Summary;

impl ContourGenerator for Summary {
    fn generate(
        &self,
        dem: &DemTile,
        target: TileCoord,
        (minor, major): (f64, f64),
        options: &ContourTileOptions,
    ) -> relief::Result<Vec<u8>> {
        Ok(format!(
            "{} from dem {} ({}, {} bytes): every {} m, major {} m, layer {}",
            target,
            dem.coord,
            dem.encoding,
            dem.data.len(),
            minor,
            major,
            options.contour_layer
        )
        .into_bytes())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let state = ViewerState {
            show_contours_and_graticules: true,
            ..Default::default()
        };
        let settings = ViewerSettings {
            custom_terrain_sources: vec![CustomTerrainSource::new(
                "custom-cog",
                "Sample COG",
                "https://data.example.com/dem.tif",
                CustomSourceType::Cog,
            )],
            ..Default::default()
        };

        let bounds = LatLngBounds::from_coords(45.95, 7.62, 46.0, 7.7);
        let mut viewer = TerrainViewer::new(
            InMemoryMap::loaded(bounds),
            settings,
            state.clone(),
            Arc::new(BlankDem),
            Arc::new(Summary),
        );

        let start = Instant::now();
        viewer.handle_event(MapEvent::Load, start);
        viewer.tick(start + Duration::from_secs(1));
        println!("state after load: {}", viewer.init_state());
        if let Some(handle) = viewer.contour_handle() {
            println!("contour tiles: {}", handle.protocol_url);
        }

        for tile in viewer.prefetch_contours(12).await {
            println!("  {}", String::from_utf8_lossy(&tile?));
        }

        let now = start + Duration::from_secs(2);
        viewer.apply_state(
            ViewerState {
                contour_minor: 25.0,
                contour_major: 100.0,
                ..state.clone()
            },
            now,
        )?;
        println!(
            "thresholds after interval change: {}",
            viewer
                .contour_handle()
                .map(|h| h.thresholds.encode())
                .unwrap_or_default()
        );

        viewer.apply_state(
            ViewerState {
                source_a: "custom-cog".to_string(),
                ..state
            },
            now,
        )?;
        viewer.tick(now + Duration::from_secs(1));
        if let Some(handle) = viewer.contour_handle() {
            let options = handle.tile_source.options();
            println!("switched to {} ({})", handle.terrain_key, options.encoding);
            println!("  dem tiles: {}", options.url);
        }

        println!("bounds: {:?}", viewer.bounds().to_bbox());
        println!("share link: ?{}", viewer.query_string()?);

        viewer.dispose();
        Ok::<(), anyhow::Error>(())
    })
}
