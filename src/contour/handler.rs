//! Serving contour tiles for the contour protocol.
//!
//! The handler turns a concrete request URL into a contour vector tile: it
//! picks the intervals for the requested zoom, loads the DEM tile covering
//! the request (through the cache, with a timeout) and hands it to the
//! external [`ContourGenerator`].

use crate::contour::cache::DemTileCache;
use crate::contour::fetch::TileFetcher;
use crate::contour::options::{ContourRequest, ContourTileOptions};
use crate::contour::source::DemSourceOptions;
use crate::core::geo::TileCoord;
use crate::protocol::ProtocolHandler;
use crate::terrain::encoding::DemEncoding;
use crate::{Result, ViewerError};
use async_trait::async_trait;
use fxhash::FxHashMap;
use std::sync::{Arc, Mutex};

/// An encoded DEM raster tile as fetched from the terrain source.
#[derive(Debug, Clone, PartialEq)]
pub struct DemTile {
    pub coord: TileCoord,
    pub encoding: DemEncoding,
    pub data: Arc<Vec<u8>>,
}

/// Derives contour geometry from elevation tiles.
///
/// `dem` covers `target`; it is an ancestor of `target` when the request
/// zooms past the terrain source's max zoom. Returns an encoded vector tile
/// with one layer named `options.contour_layer`.
pub trait ContourGenerator: Send + Sync {
    fn generate(
        &self,
        dem: &DemTile,
        target: TileCoord,
        intervals: (f64, f64),
        options: &ContourTileOptions,
    ) -> Result<Vec<u8>>;
}

pub struct ContourProtocolHandler {
    options: DemSourceOptions,
    fetcher: Arc<dyn TileFetcher>,
    generator: Arc<dyn ContourGenerator>,
    cache: DemTileCache,
    /// One lock per DEM tile being fetched; concurrent requests for the same
    /// tile wait on it and then read the cache
    in_flight: Mutex<FxHashMap<TileCoord, Arc<tokio::sync::Mutex<()>>>>,
}

impl ContourProtocolHandler {
    pub fn new(
        options: DemSourceOptions,
        fetcher: Arc<dyn TileFetcher>,
        generator: Arc<dyn ContourGenerator>,
    ) -> Self {
        let cache = DemTileCache::new(options.cache_size);
        Self {
            options,
            fetcher,
            generator,
            cache,
            in_flight: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn cache(&self) -> &DemTileCache {
        &self.cache
    }

    /// Serves one parsed request
    pub async fn contour_tile(&self, request: &ContourRequest) -> Result<Vec<u8>> {
        let Some(intervals) = request.options.thresholds.levels_for_zoom(request.coord.z) else {
            // Below the first breakpoint: empty tile
            return Ok(Vec::new());
        };

        let dem_coord = request.coord.ancestor_at(self.options.max_zoom);
        let dem = self.dem_tile(dem_coord).await?;

        if self.options.worker {
            let generator = Arc::clone(&self.generator);
            let target = request.coord;
            let options = request.options.clone();
            tokio::task::spawn_blocking(move || generator.generate(&dem, target, intervals, &options))
                .await
                .map_err(|e| ViewerError::Worker(e.to_string()))?
        } else {
            self.generator
                .generate(&dem, request.coord, intervals, &request.options)
        }
    }

    /// Loads a DEM tile from the cache or the terrain source. Concurrent
    /// requests for the same tile share a single fetch.
    pub async fn dem_tile(&self, coord: TileCoord) -> Result<DemTile> {
        let slot = self.fetch_slot(coord);
        let _guard = slot.lock().await;

        let data = match self.cache.get(&coord) {
            Some(data) => Ok(data),
            None => self.fetch_dem(coord).await.map(|data| {
                self.cache.insert(coord, Arc::clone(&data));
                data
            }),
        };
        self.release_slot(coord);
        Ok(self.wrap(coord, data?))
    }

    async fn fetch_dem(&self, coord: TileCoord) -> Result<Arc<Vec<u8>>> {
        let url = coord.fill_template(&self.options.url);
        let data = match tokio::time::timeout(self.options.timeout, self.fetcher.fetch(&url)).await {
            Ok(result) => Arc::new(result?),
            Err(_) => {
                log::warn!("DEM tile {} timed out", coord);
                return Err(ViewerError::Timeout {
                    url,
                    timeout_ms: self.options.timeout.as_millis() as u64,
                });
            }
        };
        Ok(data)
    }

    fn fetch_slot(&self, coord: TileCoord) -> Arc<tokio::sync::Mutex<()>> {
        match self.in_flight.lock() {
            Ok(mut slots) => Arc::clone(slots.entry(coord).or_default()),
            Err(_) => Arc::default(),
        }
    }

    fn release_slot(&self, coord: TileCoord) {
        if let Ok(mut slots) = self.in_flight.lock() {
            slots.remove(&coord);
        }
    }

    fn wrap(&self, coord: TileCoord, data: Arc<Vec<u8>>) -> DemTile {
        DemTile {
            coord,
            encoding: self.options.encoding,
            data,
        }
    }
}

#[async_trait]
impl ProtocolHandler for ContourProtocolHandler {
    async fn handle(&self, url: &str) -> Result<Vec<u8>> {
        let request = ContourRequest::parse(url)?;
        self.contour_tile(&request).await.map_err(|err| {
            log::error!("contour tile {} failed: {}", request.coord, err);
            err
        })
    }
}
