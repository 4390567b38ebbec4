mod camera;
mod engine;
mod settings;
pub mod worker;

pub use camera::Camera;
pub use engine::{EngineError, GenerationEngine};
pub use settings::{
    BoardSettings, EngineSettings, RuleSettings, Settings, SettingsError, ViewSettings,
};
