use crate::core::geo::TileCoord;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Hit/miss counters of a [`DemTileCache`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

/// Raw DEM tiles kept by a contour source, LRU-evicted.
///
/// Clones share the same storage.
#[derive(Debug, Clone)]
pub struct DemTileCache {
    tiles: Arc<Mutex<LruCache<TileCoord, Arc<Vec<u8>>>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl DemTileCache {
    /// A zero capacity is treated as one tile.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            tiles: Arc::new(Mutex::new(LruCache::new(capacity))),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Looks a tile up, counting the hit or miss
    pub fn get(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        let found = self.tiles.lock().ok()?.get(coord).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn insert(&self, coord: TileCoord, data: Arc<Vec<u8>>) {
        if let Ok(mut tiles) = self.tiles.lock() {
            tiles.put(coord, data);
        }
    }

    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.tiles
            .lock()
            .map(|tiles| tiles.contains(coord))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut tiles) = self.tiles.lock() {
            tiles.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.lock().map(|tiles| tiles.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.tiles.lock().map(|tiles| tiles.cap().get()).unwrap_or(0)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.len(),
        }
    }
}
