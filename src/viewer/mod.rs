pub mod hillshade;
pub mod state;
pub mod terrain_viewer;

// Re-exports for convenience
pub use hillshade::{hex_to_rgb, hillshade_layer, hillshade_paint};
pub use state::ViewerState;
pub use terrain_viewer::{MapEvent, TerrainViewer};
