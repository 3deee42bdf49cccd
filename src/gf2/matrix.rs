//! Dense matrices over GF(2)
//!
//! Rows are packed into 64-bit words, bit `c` of a row lives in word `c / 64`
//! at position `c % 64`. All row reductions produce the reduced row echelon
//! form, so the leading one of every nonzero row is the only one in its column.

use std::cell::OnceCell;
use std::fmt;
use std::ops::Range;

use crate::error::{AttackError, AttackResult};

const WORD_BITS: usize = 64;

#[inline]
fn words_for(cols: usize) -> usize {
    cols.div_ceil(WORD_BITS)
}

/// A rows x cols matrix over GF(2)
///
/// The pivot set is cached after the first rank query and dropped by every
/// mutating method. Cloning copies the bits, so a clone can be reduced or
/// permuted without touching the original.
#[derive(Clone)]
pub struct BinaryMatrix {
    rows: usize,
    cols: usize,
    stride: usize,
    data: Vec<u64>,
    pivots: OnceCell<Vec<usize>>,
}

impl BinaryMatrix {
    /// Create an all-zero matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        let stride = words_for(cols);
        Self {
            rows,
            cols,
            stride,
            data: vec![0; rows * stride],
            pivots: OnceCell::new(),
        }
    }

    /// Create the n x n identity matrix
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, true);
        }
        m
    }

    /// Build a matrix from rows of booleans
    pub fn from_rows(rows: &[Vec<bool>]) -> AttackResult<Self> {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut m = Self::zeros(rows.len(), cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(AttackError::dimension_mismatch(
                    "from_rows",
                    &format!("{} columns", cols),
                    &format!("{} columns in row {}", row.len(), i),
                ));
            }
            for (j, &bit) in row.iter().enumerate() {
                if bit {
                    m.set(i, j, true);
                }
            }
        }
        Ok(m)
    }

    /// Parse a matrix from strings of '0' and '1', mostly for tests
    pub fn from_strings(rows: &[&str]) -> AttackResult<Self> {
        let bits: Vec<Vec<bool>> = rows
            .iter()
            .map(|r| {
                r.chars()
                    .filter(|c| !c.is_whitespace())
                    .map(|c| c == '1')
                    .collect()
            })
            .collect();
        Self::from_rows(&bits)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        debug_assert!(row < self.rows && col < self.cols);
        (self.data[row * self.stride + col / WORD_BITS] >> (col % WORD_BITS)) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        debug_assert!(row < self.rows && col < self.cols);
        self.invalidate();
        let word = &mut self.data[row * self.stride + col / WORD_BITS];
        let mask = 1u64 << (col % WORD_BITS);
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    #[inline]
    pub fn toggle(&mut self, row: usize, col: usize) {
        debug_assert!(row < self.rows && col < self.cols);
        self.invalidate();
        self.data[row * self.stride + col / WORD_BITS] ^= 1u64 << (col % WORD_BITS);
    }

    #[inline]
    fn invalidate(&mut self) {
        self.pivots.take();
    }

    #[inline]
    fn row_words(&self, row: usize) -> &[u64] {
        &self.data[row * self.stride..(row + 1) * self.stride]
    }

    /// Row `row` as booleans
    pub fn row_bits(&self, row: usize) -> Vec<bool> {
        (0..self.cols).map(|c| self.get(row, c)).collect()
    }

    /// Row `row` restricted to the given columns
    pub fn row_bits_at(&self, row: usize, cols: &[usize]) -> Vec<bool> {
        cols.iter().map(|&c| self.get(row, c)).collect()
    }

    pub fn is_zero_row(&self, row: usize) -> bool {
        self.row_words(row).iter().all(|&w| w == 0)
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&w| w == 0)
    }

    /// Number of ones in the whole matrix
    pub fn count_ones(&self) -> usize {
        self.data.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// row[dst] ^= row[src], starting at word `from_word`
    #[inline]
    fn xor_row_from(&mut self, dst: usize, src: usize, from_word: usize) {
        let stride = self.stride;
        if dst == src {
            return;
        }
        let (d, s) = if dst < src {
            let (lo, hi) = self.data.split_at_mut(src * stride);
            (&mut lo[dst * stride..(dst + 1) * stride], &hi[..stride])
        } else {
            let (lo, hi) = self.data.split_at_mut(dst * stride);
            (&mut hi[..stride], &lo[src * stride..(src + 1) * stride])
        };
        for (a, b) in d[from_word..].iter_mut().zip(&s[from_word..]) {
            *a ^= *b;
        }
    }

    /// row[dst] ^= row[src]
    pub fn add_row(&mut self, dst: usize, src: usize) {
        self.invalidate();
        self.xor_row_from(dst, src, 0);
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let stride = self.stride;
        for w in 0..stride {
            self.data.swap(a * stride + w, b * stride + w);
        }
        // Row swaps keep the pivot set, but keep it simple and consistent.
        self.invalidate();
    }

    pub fn swap_columns(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.invalidate();
        for r in 0..self.rows {
            let x = self.get(r, a);
            let y = self.get(r, b);
            if x != y {
                self.toggle(r, a);
                self.toggle(r, b);
            }
        }
    }

    /// column[dst] ^= column[src]
    pub fn add_column(&mut self, dst: usize, src: usize) {
        self.invalidate();
        for r in 0..self.rows {
            if self.get(r, src) {
                self.toggle(r, dst);
            }
        }
    }

    /// Reduce in place to reduced row echelon form and return the rank
    pub fn echelonize(&mut self) -> usize {
        let mut pivots = Vec::new();
        let mut r = 0;
        for c in 0..self.cols {
            if r == self.rows {
                break;
            }
            let word = c / WORD_BITS;
            let mask = 1u64 << (c % WORD_BITS);
            let Some(p) = (r..self.rows).find(|&i| self.data[i * self.stride + word] & mask != 0)
            else {
                continue;
            };
            self.swap_rows(p, r);
            // Rows at or below r are zero left of c, so the pivot row is too.
            for i in 0..self.rows {
                if i != r && self.data[i * self.stride + word] & mask != 0 {
                    self.xor_row_from(i, r, word);
                }
            }
            pivots.push(c);
            r += 1;
        }
        self.pivots = OnceCell::new();
        let _ = self.pivots.set(pivots);
        r
    }

    /// Ascending pivot columns of the reduced row echelon form
    pub fn pivot_columns(&self) -> Vec<usize> {
        self.pivots
            .get_or_init(|| {
                let mut work = self.clone();
                work.echelonize();
                work.pivots.take().unwrap_or_default()
            })
            .clone()
    }

    pub fn rank(&self) -> usize {
        self.pivots
            .get_or_init(|| {
                let mut work = self.clone();
                work.echelonize();
                work.pivots.take().unwrap_or_default()
            })
            .len()
    }

    /// Copy of a rectangular block
    pub fn submatrix(&self, rows: Range<usize>, cols: Range<usize>) -> Self {
        debug_assert!(rows.end <= self.rows && cols.end <= self.cols);
        let mut m = Self::zeros(rows.len(), cols.len());
        for (i, r) in rows.enumerate() {
            for (j, c) in cols.clone().enumerate() {
                if self.get(r, c) {
                    m.set(i, j, true);
                }
            }
        }
        m
    }

    /// Copy of a row range, all columns
    pub fn row_range(&self, rows: Range<usize>) -> Self {
        let stride = self.stride;
        Self {
            rows: rows.len(),
            cols: self.cols,
            stride,
            data: self.data[rows.start * stride..rows.end * stride].to_vec(),
            pivots: OnceCell::new(),
        }
    }

    /// Column gather: column `j` of the result is column `indices[j]` of self
    pub fn select_columns(&self, indices: &[usize]) -> Self {
        let mut m = Self::zeros(self.rows, indices.len());
        for r in 0..self.rows {
            for (j, &c) in indices.iter().enumerate() {
                if self.get(r, c) {
                    m.set(r, j, true);
                }
            }
        }
        m
    }

    /// Row gather: row `i` of the result is row `indices[i]` of self
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut m = Self::zeros(indices.len(), self.cols);
        for (i, &r) in indices.iter().enumerate() {
            m.data[i * self.stride..(i + 1) * self.stride].copy_from_slice(self.row_words(r));
        }
        m
    }

    /// [self | other]
    pub fn hstack(&self, other: &Self) -> AttackResult<Self> {
        if self.rows != other.rows {
            return Err(AttackError::dimension_mismatch(
                "hstack",
                &format!("{} rows", self.rows),
                &format!("{} rows", other.rows),
            ));
        }
        let mut m = Self::zeros(self.rows, self.cols + other.cols);
        for r in 0..self.rows {
            for c in 0..self.cols {
                if self.get(r, c) {
                    m.set(r, c, true);
                }
            }
            for c in 0..other.cols {
                if other.get(r, c) {
                    m.set(r, self.cols + c, true);
                }
            }
        }
        Ok(m)
    }

    /// [self ; other]
    pub fn vstack(&self, other: &Self) -> AttackResult<Self> {
        if self.cols != other.cols {
            return Err(AttackError::dimension_mismatch(
                "vstack",
                &format!("{} columns", self.cols),
                &format!("{} columns", other.cols),
            ));
        }
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Ok(Self {
            rows: self.rows + other.rows,
            cols: self.cols,
            stride: self.stride,
            data,
            pivots: OnceCell::new(),
        })
    }

    /// Assemble a matrix from a grid of blocks
    pub fn block(grid: &[&[&BinaryMatrix]]) -> AttackResult<Self> {
        let mut result: Option<Self> = None;
        for row in grid {
            let mut band: Option<Self> = None;
            for m in row.iter() {
                band = Some(match band {
                    None => (*m).clone(),
                    Some(b) => b.hstack(m)?,
                });
            }
            let Some(band) = band else { continue };
            result = Some(match result {
                None => band,
                Some(r) => r.vstack(&band)?,
            });
        }
        Ok(result.unwrap_or_else(|| Self::zeros(0, 0)))
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                if self.get(r, c) {
                    t.set(c, r, true);
                }
            }
        }
        t
    }

    /// Matrix product self * other
    pub fn mul(&self, other: &Self) -> AttackResult<Self> {
        if self.cols != other.rows {
            return Err(AttackError::dimension_mismatch(
                "mul",
                &format!("{} rows on the right", self.cols),
                &format!("{} rows", other.rows),
            ));
        }
        let mut m = Self::zeros(self.rows, other.cols);
        let stride = other.stride;
        for r in 0..self.rows {
            for k in 0..self.cols {
                if self.get(r, k) {
                    let src = other.row_words(k);
                    for (d, s) in m.data[r * stride..(r + 1) * stride].iter_mut().zip(src) {
                        *d ^= *s;
                    }
                }
            }
        }
        Ok(m)
    }

    /// Elementwise sum over GF(2)
    pub fn add(&self, other: &Self) -> AttackResult<Self> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(AttackError::dimension_mismatch(
                "add",
                &format!("{}x{}", self.rows, self.cols),
                &format!("{}x{}", other.rows, other.cols),
            ));
        }
        let mut m = self.clone();
        m.invalidate();
        for (a, b) in m.data.iter_mut().zip(&other.data) {
            *a ^= *b;
        }
        Ok(m)
    }
}

impl PartialEq for BinaryMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.data == other.data
    }
}

impl Eq for BinaryMatrix {}

impl fmt::Debug for BinaryMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BinaryMatrix {}x{}", self.rows, self.cols)?;
        for r in 0..self.rows.min(64) {
            let line: String = (0..self.cols.min(128))
                .map(|c| if self.get(r, c) { '1' } else { '0' })
                .collect();
            writeln!(f, "  {}", line)?;
        }
        Ok(())
    }
}
