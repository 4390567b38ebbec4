//! Bit-packed grid contract.
//! Each cell is stored as a single bit; a row is a run of 64-cell words,
//! so cell (x, y) lives in word `x / 64` of row `y` at bit `x % 64`.

use thiserror::Error;

/// Cells per word.
pub const WORD_BITS: usize = 64;

/// Most words a single grid may hold (1 GiB of storage).
pub const MAX_WORDS: usize = 1 << 27;

/// Errors raised when building a grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid dimensions must be greater than 0 (got {width}x{height})")]
    ZeroDimension { width: usize, height: usize },
    #[error("a {width}x{height} grid exceeds the grid size limit")]
    TooLarge { width: usize, height: usize },
}

/// Direction of growth for growable grids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Whole words added to (or prepended to) every row.
    Columns,
    /// Whole rows added above or below.
    Rows,
}

/// A chunk of 64 cells stored as a single u64
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Chunk64(pub u64);

impl Chunk64 {
    /// Create empty chunk (all dead)
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Create full chunk (all alive)
    pub const fn full() -> Self {
        Self(u64::MAX)
    }

    /// Get cell state at position (0-63)
    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        debug_assert!(idx < WORD_BITS);
        (self.0 >> idx) & 1 == 1
    }

    /// Set cell state at position (0-63)
    #[inline]
    pub fn set(&mut self, idx: usize, alive: bool) {
        debug_assert!(idx < WORD_BITS);
        if alive {
            self.0 |= 1u64 << idx;
        } else {
            self.0 &= !(1u64 << idx);
        }
    }

    /// Count alive cells (population count)
    #[inline]
    pub fn count_alive(&self) -> u32 {
        self.0.count_ones()
    }

    /// Check if chunk is empty (all dead)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the positions of set bits, lowest first.
    pub fn ones(self) -> impl Iterator<Item = usize> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let idx = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(idx)
        })
    }
}

/// Mask selecting the cells of word `column` that lie below `width`.
#[inline]
pub fn width_mask(column: usize, width: usize) -> u64 {
    let start = column * WORD_BITS;
    if width >= start + WORD_BITS {
        u64::MAX
    } else if width <= start {
        0
    } else {
        (1u64 << (width - start)) - 1
    }
}

/// Number of words needed to hold `width` cells.
#[inline]
pub const fn words_for(width: usize) -> usize {
    width.div_ceil(WORD_BITS)
}

/// Words needed for a `width` x `height` grid, if it stays within
/// [`MAX_WORDS`].
pub fn grid_words(width: usize, height: usize) -> Result<usize, GridError> {
    words_for(width)
        .checked_mul(height)
        .filter(|&words| words <= MAX_WORDS)
        .ok_or(GridError::TooLarge { width, height })
}

/// Word-packed two-dimensional boolean grid.
///
/// Reads outside the current extent return dead cells and never panic.
/// What happens to out-of-range writes depends on the implementation:
/// fixed grids drop them, growable grids grow to fit.
pub trait BitGrid {
    /// State of the cell at (x, y); dead when out of range.
    fn cell_state(&self, x: i64, y: i64) -> bool;

    /// Write the cell at (x, y).
    fn set_cell_state(&mut self, x: i64, y: i64, alive: bool);

    /// Raw word `column` of `row`, 0 when out of range.
    fn element(&self, column: usize, row: usize) -> u64;

    /// Width in cells.
    fn board_width(&self) -> usize;

    /// Height in cells.
    fn board_height(&self) -> usize;

    /// Number of rows of words.
    fn num_rows(&self) -> usize;

    /// Words per row.
    fn num_columns(&self) -> usize;

    /// Whether (x, y) lies inside the current extent.
    fn has_position(&self, x: i64, y: i64) -> bool {
        x >= 0
            && y >= 0
            && (x as u64) < self.board_width() as u64
            && (y as u64) < self.board_height() as u64
    }

    /// Zero every word, keeping the extent.
    fn clear_board(&mut self);

    /// Return to the extent the grid was built with.
    fn reset_size(&mut self);

    /// Sum of the 8 Moore neighbours; cells outside the extent count as dead.
    fn count_neighbours(&self, x: i64, y: i64) -> u8 {
        let mut count = 0u8;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if self.cell_state(x + dx, y + dy) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Count total alive cells
    fn count_alive(&self) -> usize {
        let mut total = 0;
        for row in 0..self.num_rows() {
            for column in 0..self.num_columns() {
                total += self.element(column, row).count_ones() as usize;
            }
        }
        total
    }
}

/// Render a grid as rows of `O` (alive) and `.` (dead).
pub(crate) fn render(grid: &dyn BitGrid, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for y in 0..grid.board_height() as i64 {
        for x in 0..grid.board_width() as i64 {
            f.write_str(if grid.cell_state(x, y) { "O" } else { "." })?;
        }
        writeln!(f)?;
    }
    Ok(())
}
