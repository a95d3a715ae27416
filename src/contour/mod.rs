pub mod cache;
pub mod fetch;
pub mod handler;
pub mod layers;
pub mod options;
pub mod source;
pub mod thresholds;

// Re-exports for convenience
pub use handler::{ContourGenerator, DemTile};
pub use options::ContourTileOptions;
pub use source::{ContourTileSource, DemSourceOptions};
pub use thresholds::ContourThresholdTable;
