/*!
 * pqsigrm-recover
 *
 * Structural recovery of the secret column permutation of a pqsigrm-style
 * code-based signature scheme, whose public code is a permuted
 * (u, u + v) Reed-Muller construction with a few appended rows.
 *
 * The recovery works from the public key and a population of leaked
 * signature error vectors:
 *
 * - positions whose error bits correlate are paired as (u, u + v) twins
 * - the orientation of every pair is fixed with a rank criterion on the
 *   Plotkin transform of the generator
 * - the code is split into its children and the same steps run one level down
 *
 * All matrix work is over GF(2) on packed 64-bit rows.
 */

/// Error types and error codes
pub mod error;

/// GF(2) matrices, echelon forms, left solving and duals
pub mod gf2;

/// Code parameter sets and recovery tunables
pub mod params;

/// Column permutations as gather arrays
pub mod permutation;

/// Signature populations, bit transforms and the correlation oracle
pub mod signatures;

/// Pair matching, swap correction, code extraction and the depth driver
pub mod recovery;

/// File formats for keys, permutations, pairs and reports
pub mod storage;

/// Checks of a recovered permutation against a known secret key
pub mod verify;

/// Small synthetic instances with a known secret
pub mod synthetic;

pub use error::{AttackError, AttackResult};
pub use gf2::BinaryMatrix;
pub use params::{CodeParameters, Depth, ParameterSet, RecoveryConfig};
pub use permutation::Permutation;
pub use recovery::{recover_permutation, Recovery, RecoveryReport};
pub use signatures::SignatureBuffer;

/// The types and entry points most callers need
///
/// ```
/// use pqsigrm_recover::prelude::*;
///
/// let params = CodeParameters::for_set(ParameterSet::Toy32);
/// assert_eq!(params.code_n, 32);
/// ```
pub mod prelude {
    pub use crate::error::{error_codes, AttackError, AttackResult};
    pub use crate::gf2::{dual, solve_left, BinaryMatrix, Solution};
    pub use crate::params::{CodeParameters, Depth, ParameterSet, RecoveryConfig};
    pub use crate::permutation::Permutation;
    pub use crate::recovery::{
        generator_from_public_key, recover_permutation, Recovery, RecoveryReport,
    };
    pub use crate::signatures::{Correlation, CorrelationMatrix, Path, SignatureBuffer, UvPaths};
    pub use crate::storage::{
        read_matched_pairs, read_permutation, read_public_key, write_permutation, SecretKey,
    };
    pub use crate::verify::{check_twin_structure, check_u_uv_permutation, count_good_matched_pairs};
}
