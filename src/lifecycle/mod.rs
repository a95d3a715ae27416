pub mod initializer;
pub mod state;

// Re-exports for convenience
pub use initializer::{AttemptReason, ContourInitializer, ContourSourceHandle};
pub use state::{InitAttemptCounter, InitState};
