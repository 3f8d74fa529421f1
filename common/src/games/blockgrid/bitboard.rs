//! Occupancy-only board packed into three 32-bit words.
//!
//! Word `w` holds rows `3w..3w+3`; within a word a cell sits at bit
//! `(row % 3) * 9 + col`, so each word uses its low 27 bits. A 3×3 box never
//! spans two words, which keeps box tests to a single mask.

use super::board::Board;
use super::catalog::Shape;
use super::types::{BOARD_SIZE, BOX_SIZE, Point};

const WORDS: usize = 3;
const ROWS_PER_WORD: usize = 3;
const ROW_MASK: u32 = 0x1FF;
const COL_MASK: u32 = 1 | (1 << 9) | (1 << 18);
const BOX_MASK: u32 = 0x7 | (0x7 << 9) | (0x7 << 18);
const WORD_MASK: u32 = (1 << 27) - 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BitBoard {
    words: [u32; WORDS],
}

#[inline]
fn locate(row: usize, col: usize) -> (usize, u32) {
    (row / ROWS_PER_WORD, 1 << ((row % ROWS_PER_WORD) * BOARD_SIZE + col))
}

impl BitBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_board(board: &Board) -> Self {
        let mut bits = Self::new();
        for (index, &cell) in board.cells().iter().enumerate() {
            if cell != 0 {
                bits.set(Point::from_index(index));
            }
        }
        bits
    }

    pub fn words(&self) -> [u32; WORDS] {
        self.words
    }

    pub fn count(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    pub fn is_occupied(&self, point: Point) -> bool {
        if !point.in_bounds() {
            return false;
        }
        let (word, bit) = locate(point.row as usize, point.col as usize);
        self.words[word] & bit != 0
    }

    pub fn set(&mut self, point: Point) {
        let (word, bit) = locate(point.row as usize, point.col as usize);
        self.words[word] |= bit;
    }

    /// Bits the shape would occupy at `(row, col)`, or `None` if any cell
    /// leaves the board.
    pub fn shape_mask(shape: &Shape, row: i32, col: i32) -> Option<[u32; WORDS]> {
        let mut mask = [0u32; WORDS];
        for cell in &shape.cells {
            let p = cell.offset(row, col);
            if !p.in_bounds() {
                return None;
            }
            let (word, bit) = locate(p.row as usize, p.col as usize);
            mask[word] |= bit;
        }
        Some(mask)
    }

    pub fn can_place(&self, shape: &Shape, row: i32, col: i32) -> bool {
        match Self::shape_mask(shape, row, col) {
            Some(mask) => (0..WORDS).all(|w| self.words[w] & mask[w] == 0),
            None => false,
        }
    }

    /// Sets the shape's bits. Caller checks `can_place`.
    pub fn place(&mut self, shape: &Shape, row: i32, col: i32) {
        if let Some(mask) = Self::shape_mask(shape, row, col) {
            for (word, bits) in self.words.iter_mut().zip(mask) {
                *word |= bits;
            }
        }
    }

    pub fn fits_anywhere(&self, shape: &Shape) -> bool {
        let max_row = BOARD_SIZE as i32 - shape.height();
        let max_col = BOARD_SIZE as i32 - shape.width();
        (0..=max_row).any(|row| (0..=max_col).any(|col| self.can_place(shape, row, col)))
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        let shift = (row % ROWS_PER_WORD) * BOARD_SIZE;
        (self.words[row / ROWS_PER_WORD] >> shift) & ROW_MASK == ROW_MASK
    }

    pub fn is_col_full(&self, col: usize) -> bool {
        let mask = COL_MASK << col;
        self.words.iter().all(|w| w & mask == mask)
    }

    pub fn is_box_full(&self, b: usize) -> bool {
        let mask = BOX_MASK << ((b % BOX_SIZE) * BOX_SIZE);
        self.words[b / BOX_SIZE] & mask == mask
    }

    pub fn full_rows(&self) -> Vec<usize> {
        (0..BOARD_SIZE).filter(|&r| self.is_row_full(r)).collect()
    }

    pub fn full_cols(&self) -> Vec<usize> {
        (0..BOARD_SIZE).filter(|&c| self.is_col_full(c)).collect()
    }

    pub fn full_boxes(&self) -> Vec<usize> {
        (0..BOARD_SIZE).filter(|&b| self.is_box_full(b)).collect()
    }

    pub fn clear_row(&mut self, row: usize) {
        let shift = (row % ROWS_PER_WORD) * BOARD_SIZE;
        self.words[row / ROWS_PER_WORD] &= !(ROW_MASK << shift);
    }

    pub fn clear_col(&mut self, col: usize) {
        let mask = COL_MASK << col;
        for word in &mut self.words {
            *word &= !mask;
        }
    }

    pub fn clear_box(&mut self, b: usize) {
        let mask = BOX_MASK << ((b % BOX_SIZE) * BOX_SIZE);
        self.words[b / BOX_SIZE] &= !mask;
    }

    /// Detects every full group first, then clears their union.
    pub fn clear_full(&mut self) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
        let rows = self.full_rows();
        let cols = self.full_cols();
        let boxes = self.full_boxes();
        for &r in &rows {
            self.clear_row(r);
        }
        for &c in &cols {
            self.clear_col(c);
        }
        for &b in &boxes {
            self.clear_box(b);
        }
        (rows, cols, boxes)
    }

    /// Empty cells with all four orthogonal neighbors occupied or off-board.
    pub fn holes(&self) -> u32 {
        let mut holes = 0;
        for row in 0..BOARD_SIZE as i32 {
            for col in 0..BOARD_SIZE as i32 {
                let p = Point::new(row, col);
                if self.is_occupied(p) {
                    continue;
                }
                let walled = [(-1, 0), (1, 0), (0, -1), (0, 1)].iter().all(|&(dr, dc)| {
                    let n = p.offset(dr, dc);
                    !n.in_bounds() || self.is_occupied(n)
                });
                if walled {
                    holes += 1;
                }
            }
        }
        holes
    }

    /// Orthogonally adjacent occupied pairs, each counted once.
    pub fn adjacent_pairs(&self) -> u32 {
        let mut pairs = 0;
        for (w, &word) in self.words.iter().enumerate() {
            // Horizontal neighbours within each row; bit 8 of a row must not
            // pair with bit 0 of the next.
            let mut horizontal = 0;
            for r in 0..ROWS_PER_WORD {
                let row_bits = (word >> (r * BOARD_SIZE)) & ROW_MASK;
                horizontal += (row_bits & (row_bits >> 1)).count_ones();
            }
            // Vertical neighbours inside the word, then across the word seam.
            let vertical = (word & (word >> BOARD_SIZE) & (WORD_MASK >> BOARD_SIZE)).count_ones();
            let seam = if w + 1 < WORDS {
                let last_row = (word >> (2 * BOARD_SIZE)) & ROW_MASK;
                let next_first = self.words[w + 1] & ROW_MASK;
                (last_row & next_first).count_ones()
            } else {
                0
            };
            pairs += horizontal + vertical + seam;
        }
        pairs
    }

    pub fn box_occupancy(&self, b: usize) -> u32 {
        let mask = BOX_MASK << ((b % BOX_SIZE) * BOX_SIZE);
        (self.words[b / BOX_SIZE] & mask).count_ones()
    }
}
