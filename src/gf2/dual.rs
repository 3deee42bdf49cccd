//! Null-space bases (dual codes)

use super::BinaryMatrix;

/// Basis of the null space of `m`, one basis vector per row
///
/// The result has `cols(m) - rank(m)` rows, each orthogonal to every row of
/// `m`. Used to turn the public parity-check matrix into a generator matrix.
pub fn dual(m: &BinaryMatrix) -> BinaryMatrix {
    let n = m.cols();
    let mut reduced = m.clone();
    let r = reduced.echelonize();
    if r == 0 {
        return BinaryMatrix::identity(n);
    }
    if r == n {
        return BinaryMatrix::zeros(0, n);
    }
    let pivots = reduced.pivot_columns();
    let mut full_rank = reduced.row_range(0..r);

    // Bring every pivot into the leading r columns.
    let front_free = (0..r).filter(|c| pivots.binary_search(c).is_err());
    let late_pivots = pivots.iter().copied().filter(|&p| p >= r);
    let swaps: Vec<(usize, usize)> = front_free.zip(late_pivots).collect();
    for &(a, b) in &swaps {
        full_rank.swap_columns(a, b);
    }
    full_rank.echelonize();

    // full_rank is now [I_r | X]; the null space is spanned by [X^T | I].
    let complement = full_rank.submatrix(0..r, r..n).transpose();
    let mut basis = BinaryMatrix::zeros(n - r, n);
    for i in 0..n - r {
        for j in 0..r {
            if complement.get(i, j) {
                basis.set(i, j, true);
            }
        }
        basis.set(i, r + i, true);
    }
    for &(a, b) in swaps.iter().rev() {
        basis.swap_columns(a, b);
    }
    basis
}

/// Basis of `{ z : z * m = 0 }`
pub fn left_kernel(m: &BinaryMatrix) -> BinaryMatrix {
    dual(&m.transpose())
}
