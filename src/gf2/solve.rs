//! Left linear solving over GF(2)

use super::BinaryMatrix;

/// Outcome of [`solve_left`]
///
/// An unsolvable system is an ordinary result. Callers branch on it instead
/// of treating it as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Solution {
    /// A row vector `x` with `x * A = b`; free variables are set to zero
    Found(Vec<bool>),
    /// `b` is not in the row space of `A`
    NoSolution,
}

impl Solution {
    pub fn is_found(&self) -> bool {
        matches!(self, Solution::Found(_))
    }
}

/// Find `x` with `x * a = b`
pub fn solve_left(a: &BinaryMatrix, b: &[bool]) -> Solution {
    debug_assert_eq!(a.cols(), b.len());
    let unknowns = a.rows();

    // x * A = b  <=>  A^T x^T = b^T
    let mut augmented = BinaryMatrix::zeros(a.cols(), unknowns + 1);
    for r in 0..a.rows() {
        for c in 0..a.cols() {
            if a.get(r, c) {
                augmented.set(c, r, true);
            }
        }
    }
    for (c, &bit) in b.iter().enumerate() {
        if bit {
            augmented.set(c, unknowns, true);
        }
    }

    augmented.echelonize();
    let pivots = augmented.pivot_columns();
    if pivots.last() == Some(&unknowns) {
        return Solution::NoSolution;
    }

    let mut x = vec![false; unknowns];
    for (row, &p) in pivots.iter().enumerate() {
        x[p] = augmented.get(row, unknowns);
    }
    Solution::Found(x)
}

/// Row vector times matrix
pub fn vector_times(x: &[bool], a: &BinaryMatrix) -> Vec<bool> {
    let mut out = vec![false; a.cols()];
    for (r, &bit) in x.iter().enumerate() {
        if !bit {
            continue;
        }
        for (c, o) in out.iter_mut().enumerate() {
            *o ^= a.get(r, c);
        }
    }
    out
}
