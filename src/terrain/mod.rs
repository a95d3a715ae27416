pub mod basemap;
pub mod catalog;
pub mod custom;
pub mod encoding;
pub mod resolver;

// Re-exports for convenience
pub use catalog::TerrainSourceConfig;
pub use encoding::DemEncoding;
pub use resolver::{ElevationSourceResolver, ResolvedElevationSource};
