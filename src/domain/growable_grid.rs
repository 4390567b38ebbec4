//! Bit grid that grows on out-of-range writes.
//!
//! Storage is a single flat run of words addressed by `row * stride + column`,
//! with the stride tracked explicitly. Growth is word-granular for columns
//! (64 cells at a time) and row-granular for rows; it never adds a single cell.

use std::fmt;

use log::{debug, warn};

use super::bit_grid::{
    self, Axis, BitGrid, Chunk64, GridError, MAX_WORDS, WORD_BITS, grid_words, width_mask,
    words_for,
};

/// How far the local origin moved during a growth step.
///
/// A cell that was at local (x, y) before the growth is at
/// `(x + left_cells, y + top_rows)` afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Growth {
    pub left_cells: usize,
    pub top_rows: usize,
}

impl Growth {
    pub fn is_empty(&self) -> bool {
        self.left_cells == 0 && self.top_rows == 0
    }
}

#[derive(Clone, Debug)]
pub struct GrowableGrid {
    width: usize,
    height: usize,
    stride: usize,
    chunks: Vec<Chunk64>,
    default_width: usize,
    default_height: usize,
}

impl GrowableGrid {
    /// Create a grid of `width` x `height` dead cells; this extent is what
    /// [`BitGrid::reset_size`] returns to.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroDimension { width, height });
        }
        let words = grid_words(width, height)?;
        Ok(Self {
            width,
            height,
            stride: words_for(width),
            chunks: vec![Chunk64::empty(); words],
            default_width: width,
            default_height: height,
        })
    }

    /// Get grid dimensions
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Words per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub(crate) fn chunks_mut(&mut self) -> &mut [Chunk64] {
        &mut self.chunks
    }

    /// Words of row `y`.
    pub fn row(&self, y: usize) -> &[Chunk64] {
        &self.chunks[y * self.stride..(y + 1) * self.stride]
    }

    /// Grow along `axis` until index `target` is covered, filling new words
    /// with `fill`. Returns how many words (columns) or rows were prepended.
    ///
    /// For columns `target` is a cell coordinate and growth happens a word at a
    /// time; negative targets prepend `ceil(-target / 64)` words. For rows a
    /// negative target prepends `-target` rows. Growth past [`MAX_WORDS`]
    /// fails and leaves the grid untouched.
    pub fn expand_board(
        &mut self,
        axis: Axis,
        target: i64,
        fill: u64,
    ) -> Result<usize, GridError> {
        match axis {
            Axis::Columns => {
                let word_target = target.div_euclid(WORD_BITS as i64);
                let (added, leading) = shortfall(word_target, self.stride);
                if added > 0 {
                    check_extent(self.stride.saturating_add(added), self.height)?;
                    self.relayout_columns(added, leading, Chunk64(fill));
                }
                if target < 0 || target as u64 >= self.width as u64 {
                    self.width = self.stride * WORD_BITS;
                }
                Ok(leading)
            }
            Axis::Rows => {
                let (added, leading) = shortfall(target, self.height);
                if added == 0 {
                    return Ok(0);
                }
                let height = self.height.saturating_add(added);
                check_extent(self.stride, height)?;
                if leading > 0 {
                    let rows = vec![Chunk64(fill); leading * self.stride];
                    self.chunks.splice(0..0, rows);
                } else {
                    self.chunks.resize(height * self.stride, Chunk64(fill));
                }
                self.height = height;
                Ok(leading)
            }
        }
    }

    /// Rebuild storage with `added` more words per row, `leading` of them in
    /// front of the existing words.
    fn relayout_columns(&mut self, added: usize, leading: usize, fill: Chunk64) {
        let new_stride = self.stride + added;
        let mut chunks = vec![fill; new_stride * self.height];
        for (old_row, new_row) in self
            .chunks
            .chunks_exact(self.stride)
            .zip(chunks.chunks_exact_mut(new_stride))
        {
            new_row[leading..leading + self.stride].copy_from_slice(old_row);
        }
        self.chunks = chunks;
        self.stride = new_stride;
    }

    /// Randomize grid with ~25% alive cells
    pub fn randomize(&mut self) {
        use rand::Rng;
        let mut rng = rand::rng();

        for row in self.chunks.chunks_exact_mut(self.stride) {
            for (column, chunk) in row.iter_mut().enumerate() {
                // Random bits with ~25% density
                let mask = width_mask(column, self.width);
                chunk.0 = rng.random::<u64>() & rng.random::<u64>() & mask;
            }
        }
    }

    /// Set every cell inside the extent.
    pub fn fill_board(&mut self) {
        for row in self.chunks.chunks_exact_mut(self.stride) {
            for (column, chunk) in row.iter_mut().enumerate() {
                chunk.0 = width_mask(column, self.width);
            }
        }
    }

    /// Grow so that (x, y) becomes addressable. Fails without growing when
    /// the result would exceed [`MAX_WORDS`].
    pub fn ensure_contains(&mut self, x: i64, y: i64) -> Result<Growth, GridError> {
        let (words, _) = shortfall(x.div_euclid(WORD_BITS as i64), self.stride);
        let (rows, _) = shortfall(y, self.height);
        check_extent(self.stride.saturating_add(words), self.height.saturating_add(rows))?;

        let mut growth = Growth::default();
        if y < 0 || y as u64 >= self.height as u64 {
            growth.top_rows = self.expand_board(Axis::Rows, y, 0)?;
        }
        if x < 0 || x as u64 >= self.width as u64 {
            growth.left_cells = self.expand_board(Axis::Columns, x, 0)? * WORD_BITS;
        }
        if !growth.is_empty() {
            debug!(
                "grid grew to {}x{} (origin moved by {:?})",
                self.width, self.height, growth
            );
        }
        Ok(growth)
    }

    /// Write (x, y), growing first when it lies outside the extent.
    /// Returns the growth so callers tracking an origin can follow it.
    /// A write that would need more than [`MAX_WORDS`] is dropped.
    pub fn set_cell_state_growing(&mut self, x: i64, y: i64, alive: bool) -> Growth {
        let growth = if self.has_position(x, y) {
            Growth::default()
        } else {
            match self.ensure_contains(x, y) {
                Ok(growth) => growth,
                Err(err) => {
                    warn!("dropped write to ({x}, {y}): {err}");
                    return Growth::default();
                }
            }
        };
        let x = (x + growth.left_cells as i64) as usize;
        let y = (y + growth.top_rows as i64) as usize;
        self.chunks[y * self.stride + x / WORD_BITS].set(x % WORD_BITS, alive);
        growth
    }
}

/// Slots to add so that `index` falls inside `0..len`, and how many of
/// them go in front.
fn shortfall(index: i64, len: usize) -> (usize, usize) {
    if index < 0 {
        let count = usize::try_from(index.unsigned_abs()).unwrap_or(usize::MAX);
        (count, count)
    } else {
        let index = usize::try_from(index).unwrap_or(usize::MAX);
        (index.saturating_add(1).saturating_sub(len), 0)
    }
}

fn check_extent(stride: usize, height: usize) -> Result<(), GridError> {
    match stride.checked_mul(height) {
        Some(words) if words <= MAX_WORDS => Ok(()),
        _ => Err(GridError::TooLarge {
            width: stride.saturating_mul(WORD_BITS),
            height,
        }),
    }
}

impl BitGrid for GrowableGrid {
    fn cell_state(&self, x: i64, y: i64) -> bool {
        if !self.has_position(x, y) {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        self.chunks[y * self.stride + x / WORD_BITS].get(x % WORD_BITS)
    }

    fn set_cell_state(&mut self, x: i64, y: i64, alive: bool) {
        self.set_cell_state_growing(x, y, alive);
    }

    fn element(&self, column: usize, row: usize) -> u64 {
        if row >= self.height || column >= self.stride {
            return 0;
        }
        self.chunks[row * self.stride + column].0
    }

    fn board_width(&self) -> usize {
        self.width
    }

    fn board_height(&self) -> usize {
        self.height
    }

    fn num_rows(&self) -> usize {
        self.height
    }

    fn num_columns(&self) -> usize {
        self.stride
    }

    fn clear_board(&mut self) {
        self.chunks.fill(Chunk64::empty());
    }

    fn reset_size(&mut self) {
        self.width = self.default_width;
        self.height = self.default_height;
        self.stride = words_for(self.width);
        self.chunks = vec![Chunk64::empty(); self.stride * self.height];
    }
}

impl fmt::Display for GrowableGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        bit_grid::render(self, f)
    }
}
