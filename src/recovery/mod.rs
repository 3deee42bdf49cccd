//! Permutation recovery
//!
//! Pairs positions from signature correlations, orients every pair with
//! the offending-rank criterion on the Plotkin transform, splits the code
//! into its children and repeats one level down.
//!
//! ```text
//! depth 1:  correlate N positions -> match -> order pairs -> fix swaps
//! depth 2:  relabel signatures -> fold U and V -> match N/2 -> refine
//!           -> extract (A, U, V) -> fix swaps inside U
//! ```

mod driver;
mod extract;
mod matching;
mod swaps;

pub use driver::{
    depth1, depth2, generator_from_public_key, pearson_for_paths, recover_permutation,
    DepthOutcome, DepthReport, Recovery, RecoveryReport,
};
pub use extract::{extract_codes, CodeDimensions, CodeTriple};
pub use matching::{
    apply_blockwise_permutation, match_from_correlation, permutation_from_pairs, Matching,
};
pub use swaps::{
    apply_swaps, find_swaps, offending_rank, plotkin_transform, SwapOutcome, SwapVector,
};
