// Domain layer - grids, rules and the RLE pattern format
pub mod domain;

// Application layer - the generation engine and its settings
pub mod application;

// Re-exports for convenience
pub use application::{Camera, EngineError, GenerationEngine, Settings};
pub use domain::{BitGrid, FixedGrid, GrowableGrid, LifeRule, Pattern, RuleSet, presets};
