//! Splitting a column-ordered generator into its A, U and V parts

use serde::Serialize;

use super::swaps::TwinView;
use crate::error::AttackResult;
use crate::gf2::BinaryMatrix;

/// Sub-generators of one decomposition level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTriple {
    /// Appended rows, in the original (left | right) coordinates
    pub a: BinaryMatrix,
    /// Generator of the u child, length R
    pub u: BinaryMatrix,
    /// Generator of the v child, length R
    pub v: BinaryMatrix,
}

/// Realised dimensions of a [`CodeTriple`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodeDimensions {
    pub dim_a: usize,
    pub dim_u: usize,
    pub dim_v: usize,
}

impl CodeTriple {
    pub fn dimensions(&self) -> CodeDimensions {
        CodeDimensions {
            dim_a: self.a.rows(),
            dim_u: self.u.rows(),
            dim_v: self.v.rows(),
        }
    }

    /// Rebuild generator rows: A as is, (u, u) and (0, v)
    pub fn reexpand(&self) -> AttackResult<BinaryMatrix> {
        let uu = self.u.hstack(&self.u)?;
        let zero = BinaryMatrix::zeros(self.v.rows(), self.v.cols());
        let zv = zero.hstack(&self.v)?;
        self.a.vstack(&uu)?.vstack(&zv)
    }
}

/// Extract A, U and V from a generator whose twins sit at distance R
///
/// In the reduced GPJ the upper rows (left pivots) carry V and the appended
/// rows; a row operation on them isolates the rows whose right half is
/// independent (A) from those whose right half vanishes (V). The lower rows
/// are (0, u) and give U.
pub fn extract_codes(gp: &BinaryMatrix) -> AttackResult<CodeTriple> {
    let view = TwinView::new(gp)?;
    let (half, dim_va, k) = (view.half, view.dim_va, gp.rows());

    let upper_right = view.upper_right();
    let dim_a = upper_right.rank();
    let dim_v = dim_va - dim_a;

    // Row-reduce [upper_right | I] and keep the transform S.
    let mut augmented = upper_right.hstack(&BinaryMatrix::identity(dim_va))?;
    augmented.echelonize();
    let s = augmented.submatrix(0..dim_va, half..half + dim_va);

    let s_full = BinaryMatrix::block(&[
        &[&s, &BinaryMatrix::zeros(dim_va, k - dim_va)],
        &[&BinaryMatrix::zeros(k - dim_va, dim_va), &BinaryMatrix::identity(k - dim_va)],
    ])?;
    let sgpj = s_full.mul(&view.gpj)?;

    let a_right = sgpj.submatrix(0..dim_a, half..2 * half);
    let a_left = sgpj.submatrix(0..dim_a, 0..half);
    // GPJ row (l, r) came from generator row (r, l + r).
    let a = a_right.hstack(&a_left.add(&a_right)?)?;
    let v = sgpj.submatrix(dim_a..dim_va, 0..half);
    let u = sgpj.submatrix(dim_va..k, half..2 * half);

    log::debug!(
        "Extracted codes at half-length {}: dim A = {}, dim U = {}, dim V = {}",
        half,
        dim_a,
        u.rows(),
        dim_v
    );
    Ok(CodeTriple { a, u, v })
}
