//! Engine-wide identifiers and magic numbers for the contour pipeline.
//! Keeping them in a single place makes it easier to tweak them.

/// Vector source carrying the derived contour tiles.
pub const CONTOUR_SOURCE_ID: &str = "contour-source";

/// Line layer drawing contour lines.
pub const CONTOUR_LINES_LAYER_ID: &str = "contour-lines";

/// Symbol layer drawing elevation labels along major contours.
pub const CONTOUR_LABELS_LAYER_ID: &str = "contour-labels";

/// Layer name inside each contour vector tile.
pub const CONTOUR_SOURCE_LAYER: &str = "contours";

/// Feature property holding the contour elevation.
pub const ELEVATION_KEY: &str = "ele";

/// Feature property holding the contour level (0 = minor, 1 = major).
pub const LEVEL_KEY: &str = "level";

/// Vector tile extent of generated contour tiles.
pub const CONTOUR_TILE_EXTENT: u32 = 4096;

/// Buffer (in tile pixels) around generated contour tiles.
pub const CONTOUR_TILE_BUFFER: u32 = 1;

/// Highest zoom the contour vector source is requested at; the engine overzooms past it.
pub const CONTOUR_SOURCE_MAX_ZOOM: u8 = 15;

/// Raster-dem sources feeding 3D terrain and hillshading.
pub const TERRAIN_SOURCE_ID: &str = "terrainSource";
pub const HILLSHADE_SOURCE_ID: &str = "hillshadeSource";

/// Raster basemap source.
pub const RASTER_BASEMAP_SOURCE_ID: &str = "raster-basemap-source";

/// Default decoder id; protocol schemes are derived from it.
pub const DEFAULT_DEM_SOURCE_ID: &str = "dem";

/// Number of DEM tiles kept by a contour source.
pub const DEM_CACHE_SIZE: usize = 100;

/// Per-tile request timeout of a contour source.
pub const DEM_TIMEOUT_MS: u64 = 10_000;

/// Max zoom assumed for custom terrain sources and unknown keys.
pub const DEFAULT_DEM_MAX_ZOOM: u8 = 14;

/// Contour setup attempts per terrain source before giving up.
pub const MAX_INIT_ATTEMPTS: u32 = 5;

/// Delay before (re)checking whether the style finished loading.
pub const STYLE_RECHECK_DELAY_MS: u64 = 1_000;

/// Delay before retrying a failed contour setup.
pub const INIT_RETRY_DELAY_MS: u64 = 2_000;

/// Default TiTiler deployment used to serve COG/VRT terrain.
pub const DEFAULT_TITILER_ENDPOINT: &str = "https://titiler.xyz";
