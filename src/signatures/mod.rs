//! Signature populations and the correlation oracle
//!
//! This module owns the raw signature records, the per-record bit transforms
//! that undo one level of the (u, u+v) construction, and the Pearson
//! correlation accumulator the pair matcher is fed from.

mod buffer;
mod cache;
mod correlation;
mod paths;
mod transform;

pub use buffer::SignatureBuffer;
pub use cache::CorrelationCache;
pub use correlation::{Correlation, CorrelationMatrix};
pub use paths::{check_path_len, Path, Step, UvPaths};
pub use transform::{and_half_bits, permute_bits, xor_half_bits};
