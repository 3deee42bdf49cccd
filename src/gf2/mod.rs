//! Linear algebra over GF(2)
//!
//! This module provides the bit-matrix type the recovery works on, reduced
//! row echelon forms, left solving and the null-space (dual code) transform.

mod dual;
mod matrix;
mod solve;
mod tests;

pub use dual::{dual, left_kernel};
pub use matrix::BinaryMatrix;
pub use solve::{solve_left, vector_times, Solution};

/// Standard inner product of two bit rows
pub fn dot(a: &[bool], b: &[bool]) -> bool {
    a.iter().zip(b).fold(false, |acc, (&x, &y)| acc ^ (x & y))
}
