pub mod controller;
pub mod engine;
pub mod memory;
pub mod spec;

// Re-exports for convenience
pub use controller::{ContourVisibility, MapSurfaceController};
pub use engine::MapEngine;
pub use memory::InMemoryMap;
pub use spec::{LayerKind, LayerSpec, SourceSpec};
