mod bit_grid;
mod double_buffer;
mod fixed_grid;
mod growable_grid;
mod patterns;
pub mod rle;
mod rule_library;
mod rule_set;
mod rules;

pub use bit_grid::{
    Axis, BitGrid, Chunk64, GridError, MAX_WORDS, WORD_BITS, grid_words, width_mask, words_for,
};
pub use double_buffer::DoubleBuffer;
pub use fixed_grid::FixedGrid;
pub use growable_grid::{GrowableGrid, Growth};
pub use patterns::{Preset, presets};
pub use rle::{Corner, CornerConvention, Pattern, PatternError};
pub use rule_library::{
    LibraryError, RuleCursor, RuleEntry, RuleLibrary, builtin_rules, read_records, write_records,
};
pub use rule_set::{RuleSet, SharedRules, read_rules, write_rules};
pub use rules::{LifeRule, RuleError, RuleFormat};
