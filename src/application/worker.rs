//! Per-worker generation kernel and the frontier scan that runs before it.
//!
//! Only cells next to a cell that changed last tick can change this tick, so
//! each word's candidates are the activity of rows `y-1..=y+1` dilated one
//! cell left and right (carrying across word boundaries). Candidates are
//! recomputed with the rule; every other cell keeps its state and goes
//! inactive.

use crate::domain::{BitGrid, Chunk64, GrowableGrid, LifeRule, RuleError, WORD_BITS, width_mask};

/// Sides of the grid that hold a live or active cell on their outermost
/// row or column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frontier {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl Frontier {
    pub fn any(&self) -> bool {
        self.top || self.bottom || self.left || self.right
    }
}

/// Scan the edges of `live` and `active`, which must share an extent.
pub fn frontier(live: &GrowableGrid, active: &GrowableGrid) -> Frontier {
    let (width, height) = live.dimensions();
    let stride = live.stride();
    let word = |column: usize, row: usize| live.element(column, row) | active.element(column, row);
    let edge_row = |row: usize| (0..stride).any(|column| word(column, row) != 0);

    let last = width - 1;
    let (right_word, right_bit) = (last / WORD_BITS, last % WORD_BITS);
    Frontier {
        top: edge_row(0),
        bottom: edge_row(height - 1),
        left: (0..height).any(|row| word(0, row) & 1 != 0),
        right: (0..height).any(|row| (word(right_word, row) >> right_bit) & 1 != 0),
    }
}

/// OR of the activity words of rows `y-1`, `y` and `y+1`.
fn vertical_activity(active: &GrowableGrid, y: usize, out: &mut [u64]) {
    for (column, slot) in out.iter_mut().enumerate() {
        let above = if y > 0 { active.element(column, y - 1) } else { 0 };
        *slot = above | active.element(column, y) | active.element(column, y + 1);
    }
}

/// Cells of word `column` whose neighbourhood saw a change.
#[inline]
fn candidates(vertical: &[u64], column: usize, width: usize) -> u64 {
    let centre = vertical[column];
    let left = if column > 0 { vertical[column - 1] >> 63 } else { 0 };
    let right = vertical.get(column + 1).map_or(0, |word| word << 63);
    (centre | centre << 1 | centre >> 1 | left | right) & width_mask(column, width)
}

/// Compute the next generation for the rows starting at `first_row`.
///
/// `next_live` and `next_active` hold whole rows of `live.stride()` words;
/// every word in them is overwritten.
pub fn step_rows(
    live: &GrowableGrid,
    active: &GrowableGrid,
    rule: &LifeRule,
    first_row: usize,
    next_live: &mut [Chunk64],
    next_active: &mut [Chunk64],
) -> Result<(), RuleError> {
    let stride = live.stride();
    let width = live.board_width();
    let mut vertical = vec![0u64; stride];

    for (offset, (live_row, active_row)) in next_live
        .chunks_exact_mut(stride)
        .zip(next_active.chunks_exact_mut(stride))
        .enumerate()
    {
        let y = first_row + offset;
        vertical_activity(active, y, &mut vertical);

        for column in 0..stride {
            let mut word = Chunk64(live.element(column, y));
            let mut changed = Chunk64::empty();
            for bit in Chunk64(candidates(&vertical, column, width)).ones() {
                let x = (column * WORD_BITS + bit) as i64;
                let alive = word.get(bit);
                let next = rule.evaluate(alive, live.count_neighbours(x, y as i64))?;
                if next != alive {
                    word.set(bit, next);
                    changed.set(bit, true);
                }
            }
            live_row[column] = word;
            active_row[column] = changed;
        }
    }
    Ok(())
}
