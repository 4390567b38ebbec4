//! Bounded bit grid over a flat word array.

use std::fmt;

use super::bit_grid::{self, BitGrid, Chunk64, GridError, WORD_BITS, grid_words, words_for};

/// Bit-packed grid with an extent fixed at construction.
/// Out-of-range writes are dropped.
#[derive(Clone, Debug)]
pub struct FixedGrid {
    /// Width in cells
    width: usize,
    /// Height in cells
    height: usize,
    /// Width in chunks (ceil(width / 64))
    chunk_width: usize,
    /// Flat array of chunks, row-major order
    chunks: Vec<Chunk64>,
}

impl FixedGrid {
    /// Create new empty grid
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::ZeroDimension { width, height });
        }
        let words = grid_words(width, height)?;
        Ok(Self {
            width,
            height,
            chunk_width: words_for(width),
            chunks: vec![Chunk64::empty(); words],
        })
    }

    /// Get grid dimensions
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Total memory usage in bytes
    pub fn memory_bytes(&self) -> usize {
        self.chunks.len() * std::mem::size_of::<Chunk64>()
    }

    #[inline]
    fn index(&self, x: i64, y: i64) -> Option<(usize, usize)> {
        if !self.has_position(x, y) {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        Some((y * self.chunk_width + x / WORD_BITS, x % WORD_BITS))
    }
}

impl BitGrid for FixedGrid {
    fn cell_state(&self, x: i64, y: i64) -> bool {
        self.index(x, y)
            .is_some_and(|(chunk, bit)| self.chunks[chunk].get(bit))
    }

    fn set_cell_state(&mut self, x: i64, y: i64, alive: bool) {
        if let Some((chunk, bit)) = self.index(x, y) {
            self.chunks[chunk].set(bit, alive);
        }
    }

    fn element(&self, column: usize, row: usize) -> u64 {
        if row >= self.height || column >= self.chunk_width {
            return 0;
        }
        self.chunks[row * self.chunk_width + column].0
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
        self.chunk_width
    }

    fn clear_board(&mut self) {
        self.chunks.fill(Chunk64::empty());
    }

    fn reset_size(&mut self) {}
}

impl fmt::Display for FixedGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        bit_grid::render(self, f)
    }
}
