//! The active rule plus the library it is selected from.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::warn;

use super::rule_library::{LibraryError, RuleEntry, RuleLibrary};
use super::rules::{LifeRule, RuleError};

/// A rule set shared between the engine and whoever edits rules.
///
/// The engine only takes the read lock long enough to copy the active
/// [`LifeRule`] at the start of a tick, so editing never races a tick.
pub type SharedRules = Arc<RwLock<RuleSet>>;

#[derive(Clone, Debug)]
pub struct RuleSet {
    active: LifeRule,
    library: RuleLibrary,
}

impl RuleSet {
    /// Conway's rule with the built-in library held in memory.
    pub fn new() -> Self {
        Self { active: LifeRule::CONWAY, library: RuleLibrary::in_memory() }
    }

    /// Conway's rule with the library stored at `path`, created on first use.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        Ok(Self { active: LifeRule::CONWAY, library: RuleLibrary::open(path)? })
    }

    pub fn into_shared(self) -> SharedRules {
        Arc::new(RwLock::new(self))
    }

    pub fn active(&self) -> LifeRule {
        self.active
    }

    /// Next state of a cell under the active rule.
    pub fn evaluate(&self, alive: bool, neighbours: u8) -> Result<bool, RuleError> {
        self.active.evaluate(alive, neighbours)
    }

    /// Make `rule_string` the active rule. Invalid or missing strings select
    /// Conway's rule; the return value says whether the string was accepted.
    pub fn set_rules(&mut self, rule_string: Option<&str>) -> bool {
        match rule_string.map(LifeRule::parse) {
            Some(Ok(rule)) => {
                self.active = rule;
                true
            }
            other => {
                if let Some(Err(e)) = other {
                    warn!("{e}, falling back to {}", LifeRule::CONWAY);
                }
                self.active = LifeRule::CONWAY;
                false
            }
        }
    }

    pub fn set_rule(&mut self, rule: LifeRule) {
        self.active = rule;
    }

    pub fn rule_string(&self) -> String {
        self.active.to_rule_string()
    }

    pub fn library(&self) -> &RuleLibrary {
        &self.library
    }

    /// Activate the library entry at `index`.
    pub fn select(&mut self, index: usize) -> Result<&RuleEntry, LibraryError> {
        let entry = self.library.get(index).ok_or(LibraryError::UnknownIndex(index))?;
        self.active = entry.rule();
        Ok(entry)
    }

    /// Activate the first library entry called `name`.
    pub fn select_by_name(&mut self, name: &str) -> Result<&RuleEntry, LibraryError> {
        let index = self
            .library
            .position_of(name)
            .ok_or_else(|| LibraryError::UnknownRule(name.to_string()))?;
        self.select(index)
    }

    /// Append a named rule and rewrite the library file. When the file
    /// cannot be written the rule is not kept.
    pub fn add_rule(
        &mut self,
        name: &str,
        rule_string: &str,
        description: &str,
    ) -> Result<RuleEntry, LibraryError> {
        let entry = self.library.add(name, rule_string, description)?.clone();
        if let Err(err) = self.library.save() {
            self.library.pop();
            return Err(err);
        }
        Ok(entry)
    }

    pub fn save(&self) -> Result<(), LibraryError> {
        self.library.save()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Read access that survives a panicked writer; rule data is replaced whole,
/// never left half-written.
pub fn read_rules(rules: &SharedRules) -> RwLockReadGuard<'_, RuleSet> {
    rules.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write_rules(rules: &SharedRules) -> RwLockWriteGuard<'_, RuleSet> {
    rules.write().unwrap_or_else(PoisonError::into_inner)
}
