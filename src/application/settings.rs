//! Engine settings loaded from TOML.
//!
//! ```toml
//! [board]
//! width = 160
//! height = 120
//!
//! [engine]
//! workers = 0        # 0 uses every available core
//!
//! [rules]
//! library = "rules.bin"
//! active = "B3/S23"
//!
//! [view]
//! cell_size = 5.0
//! ```
//!
//! Every key is optional.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{LibraryError, LifeRule, RuleSet, SharedRules};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not read settings {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("malformed settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("board dimensions must be greater than 0 (got {width}x{height})")]
    ZeroDimension { width: usize, height: usize },
    #[error("cell size must be positive (got {0})")]
    InvalidCellSize(f32),
    #[error("invalid active rule {0:?}")]
    InvalidRule(String),
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub board: BoardSettings,
    pub engine: EngineSettings,
    pub rules: RuleSettings,
    pub view: ViewSettings,
}

/// Extent the grids start with and return to on reset.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BoardSettings {
    pub width: usize,
    pub height: usize,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self { width: 160, height: 120 }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Worker threads per tick; 0 means one per available core.
    pub workers: usize,
}

impl EngineSettings {
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSettings {
    /// Rule library file; the built-in rules stay in memory when unset.
    pub library: Option<PathBuf>,
    /// Rule active at startup; Conway's rule when unset.
    pub active: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ViewSettings {
    pub cell_size: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self { cell_size: 5.0 }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let BoardSettings { width, height } = self.board;
        if width == 0 || height == 0 {
            return Err(SettingsError::ZeroDimension { width, height });
        }
        if !(self.view.cell_size > 0.0) {
            return Err(SettingsError::InvalidCellSize(self.view.cell_size));
        }
        if let Some(rule) = &self.rules.active {
            if !LifeRule::validate(rule) {
                return Err(SettingsError::InvalidRule(rule.clone()));
            }
        }
        Ok(())
    }

    /// Build the rule set these settings describe, opening (or creating)
    /// the library file if one is configured.
    pub fn shared_rules(&self) -> Result<SharedRules, LibraryError> {
        let mut rules = match &self.rules.library {
            Some(path) => RuleSet::open(path)?,
            None => RuleSet::new(),
        };
        if self.rules.active.is_some() {
            rules.set_rules(self.rules.active.as_deref());
        }
        Ok(rules.into_shared())
    }
}

impl std::str::FromStr for Settings {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let settings: Settings = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }
}
