//! Synthetic two-level Plotkin instances
//!
//! Builds a small code with the same shape as the attacked scheme: appended
//! rows on top of (u, u + v) with u in RM(r, m-1) and v in RM(r-1, m-1),
//! hidden behind a random column permutation, together with a population of
//! error vectors whose bits are biased along the Plotkin levels.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::error::{error_codes, AttackError, AttackResult};
use crate::gf2::{dual, BinaryMatrix};
use crate::params::CodeParameters;
use crate::permutation::Permutation;
use crate::signatures::SignatureBuffer;

const MAX_ATTEMPTS: usize = 1000;

/// Knobs for the synthetic signature population
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticOptions {
    pub signatures: usize,
    pub seed: u64,
    /// Probability that a bit of the inner v part is set
    pub fold_bias: f64,
    /// Probability that a bit of the outer v part (and its inner split) is set
    pub noise: f64,
}

impl Default for SyntheticOptions {
    fn default() -> Self {
        Self {
            signatures: 8000,
            seed: 0x5eed,
            fold_bias: 0.25,
            noise: 0.05,
        }
    }
}

/// A generated instance with its secret
#[derive(Debug, Clone)]
pub struct SyntheticInstance {
    pub params: CodeParameters,
    /// Generator in structured column order
    pub structured_generator: BinaryMatrix,
    /// Secret key Q: public position `p` is structured column `Q[p]`
    pub secret: Permutation,
    /// Generator in public column order
    pub public_generator: BinaryMatrix,
    /// Non-systematic block T of the public parity-check matrix [I | T]
    pub public_key: BinaryMatrix,
    pub signatures: SignatureBuffer,
}

/// Reed-Muller generator RM(r, m) in Plotkin order
///
/// The top bit of a position index selects the half, so twins at every
/// level sit at distance 2^(level).
pub fn rm_generator(r: usize, m: usize) -> BinaryMatrix {
    let n = 1usize << m;
    if r == 0 {
        let mut ones = BinaryMatrix::zeros(1, n);
        for c in 0..n {
            ones.set(0, c, true);
        }
        return ones;
    }
    if r >= m {
        return BinaryMatrix::identity(n);
    }
    let u = rm_generator(r, m - 1);
    let v = rm_generator(r - 1, m - 1);
    let half = n / 2;
    let mut g = BinaryMatrix::zeros(u.rows() + v.rows(), n);
    for i in 0..u.rows() {
        for c in 0..half {
            if u.get(i, c) {
                g.set(i, c, true);
                g.set(i, half + c, true);
            }
        }
    }
    for i in 0..v.rows() {
        for c in 0..half {
            if v.get(i, c) {
                g.set(u.rows() + i, half + c, true);
            }
        }
    }
    g
}

fn random_rows(rng: &mut ChaCha20Rng, rows: usize, cols: usize) -> BinaryMatrix {
    let mut m = BinaryMatrix::zeros(rows, cols);
    for r in 0..rows {
        for c in 0..cols {
            if rng.gen_bool(0.5) {
                m.set(r, c, true);
            }
        }
    }
    m
}

/// Appended rows whose left+right sums are independent of U and which keep
/// `k_app` offending dimensions under every twin orientation
fn appended_rows(
    rng: &mut ChaCha20Rng,
    u: &BinaryMatrix,
    v: &BinaryMatrix,
    k_app: usize,
) -> AttackResult<BinaryMatrix> {
    let half = u.cols();
    for _ in 0..MAX_ATTEMPTS {
        let a = random_rows(rng, k_app, 2 * half);
        let left = a.submatrix(0..k_app, 0..half);
        let right = a.submatrix(0..k_app, half..2 * half);
        let sum = left.add(&right)?;
        if u.vstack(&sum)?.rank() == u.rows() + k_app
            && u.vstack(&left)?.rank() == u.rows() + k_app
            && orientations_keep_rank(u, v, &left, &sum, k_app)
        {
            return Ok(a);
        }
    }
    Err(AttackError::generation_error(
        "no appended rows keep their rank under every twin orientation",
        error_codes::UNSUPPORTED_SYNTHETIC_SHAPE,
    ))
}

/// Halves up to this length are checked over every orientation
const EXHAUSTIVE_ORIENTATION_HALF: usize = 16;

/// Linear span over GF(2) kept as one reduced vector per leading bit
#[derive(Clone)]
struct XorBasis([u64; 64]);

impl XorBasis {
    fn new() -> Self {
        Self([0; 64])
    }

    /// Add `x` to the span; true if it was independent
    fn insert(&mut self, mut x: u64) -> bool {
        while x != 0 {
            let lead = 63 - x.leading_zeros() as usize;
            if self.0[lead] == 0 {
                self.0[lead] = x;
                return true;
            }
            x ^= self.0[lead];
        }
        false
    }
}

fn row_mask(m: &BinaryMatrix, row: usize) -> u64 {
    (0..m.cols())
        .filter(|&c| m.get(row, c))
        .fold(0u64, |acc, c| acc | (1u64 << c))
}

/// Whether every swap mask `s` of the twins keeps `k_app` offending dimensions
///
/// Twin orientation leaves U and the left half of GPJ alone. The right half
/// of a V row becomes `v & s` and that of an appended row `l ^ (d & s)` with
/// `d = l ^ r`, so the offending rank is what those add on top of U. Masks
/// that are affine functions of the column index collapse V into U and are
/// tried first. Halves too long to enumerate pass unchecked.
fn orientations_keep_rank(
    u: &BinaryMatrix,
    v: &BinaryMatrix,
    left: &BinaryMatrix,
    sum: &BinaryMatrix,
    k_app: usize,
) -> bool {
    let half = u.cols();
    if half > EXHAUSTIVE_ORIENTATION_HALF {
        return true;
    }
    let mut base = XorBasis::new();
    for row in 0..u.rows() {
        base.insert(row_mask(u, row));
    }
    let v_rows: Vec<u64> = (0..v.rows()).map(|r| row_mask(v, r)).collect();
    let a_rows: Vec<(u64, u64)> = (0..left.rows())
        .map(|r| (row_mask(left, r), row_mask(sum, r)))
        .collect();

    let offending = |s: u64| {
        let mut span = base.clone();
        let mut added = 0;
        for &x in &v_rows {
            added += usize::from(span.insert(x & s));
        }
        for &(l, d) in &a_rows {
            added += usize::from(span.insert(l ^ (d & s)));
        }
        added
    };

    let mut masks = affine_masks(half);
    masks.extend(0..1u64 << half);
    masks.into_iter().all(|s| offending(s) >= k_app)
}

/// Indicators of the affine functions `c -> <a, c> + b` on `0..half`
fn affine_masks(half: usize) -> Vec<u64> {
    let all = (1u64 << half) - 1;
    let mut masks = Vec::with_capacity(2 * half);
    for a in 0..half {
        let mask = (0..half)
            .filter(|&c| (a & c).count_ones() % 2 == 1)
            .fold(0u64, |acc, c| acc | (1u64 << c));
        masks.push(mask);
        masks.push(mask ^ all);
    }
    masks
}

fn bernoulli_bits(rng: &mut ChaCha20Rng, len: usize, p: f64) -> Vec<bool> {
    (0..len).map(|_| rng.gen_bool(p)).collect()
}

fn xor(a: &[bool], b: &[bool]) -> Vec<bool> {
    a.iter().zip(b).map(|(&x, &y)| x ^ y).collect()
}

fn plotkin(a: &[bool], b: &[bool]) -> Vec<bool> {
    let mut out = a.to_vec();
    out.extend(xor(a, b));
    out
}

impl SyntheticInstance {
    /// Generate an instance for `params`
    ///
    /// Only unmodified children are supported: `dim_u` and `dim_v` must be
    /// the dimensions of RM(r, m-1) and RM(r-1, m-1).
    pub fn generate(params: &CodeParameters, options: &SyntheticOptions) -> AttackResult<Self> {
        params.validate()?;
        let (r, m, n) = (params.code_r, params.code_m, params.code_n);
        let half = n / 2;
        let u = rm_generator(r, m - 1);
        let v = rm_generator(r - 1, m - 1);
        if u.rows() != params.dim_u || v.rows() != params.dim_v {
            return Err(AttackError::generation_error(
                &format!(
                    "children RM({},{}) and RM({},{}) have dimensions {} and {}, parameters ask for {} and {}",
                    r,
                    m - 1,
                    r - 1,
                    m - 1,
                    u.rows(),
                    v.rows(),
                    params.dim_u,
                    params.dim_v
                ),
                error_codes::UNSUPPORTED_SYNTHETIC_SHAPE,
            ));
        }

        let mut rng = ChaCha20Rng::seed_from_u64(options.seed);
        let a = appended_rows(&mut rng, &u, &v, params.k_app)?;
        let uu = u.hstack(&u)?;
        let zv = BinaryMatrix::zeros(v.rows(), half).hstack(&v)?;
        let structured_generator = a.vstack(&uu)?.vstack(&zv)?;

        let (secret, public_generator, public_key) =
            Self::hide(&mut rng, &structured_generator, params)?;

        let signatures = Self::signatures(&mut rng, &secret, params, options)?;

        Ok(Self {
            params: *params,
            structured_generator,
            secret,
            public_generator,
            public_key,
            signatures,
        })
    }

    /// Draw secret permutations until the public parity check is systematic
    fn hide(
        rng: &mut ChaCha20Rng,
        structured: &BinaryMatrix,
        params: &CodeParameters,
    ) -> AttackResult<(Permutation, BinaryMatrix, BinaryMatrix)> {
        let n = params.code_n;
        let dim_t = params.dim_t();
        for _ in 0..MAX_ATTEMPTS {
            let mut q: Vec<usize> = (0..n).collect();
            q.shuffle(rng);
            let public_generator = structured.select_columns(&q);
            let mut h = dual(&public_generator);
            if h.rows() != dim_t {
                return Err(AttackError::generation_error(
                    &format!("parity check has {} rows, expected {}", h.rows(), dim_t),
                    error_codes::UNSUPPORTED_SYNTHETIC_SHAPE,
                ));
            }
            h.echelonize();
            if h.pivot_columns() == (0..dim_t).collect::<Vec<_>>() {
                let t = h.submatrix(0..dim_t, dim_t..n);
                return Ok((Permutation::new(q)?, public_generator, t));
            }
        }
        Err(AttackError::generation_error(
            "no permutation with a systematic parity check",
            error_codes::SYSTEMATIC_FORM_NOT_FOUND,
        ))
    }

    /// Error vectors e = (a, a + b), a = (c, c + d), b = (f, f + g)
    ///
    /// c is uniform, d has density `fold_bias`, f and g have density `noise`.
    fn signatures(
        rng: &mut ChaCha20Rng,
        secret: &Permutation,
        params: &CodeParameters,
        options: &SyntheticOptions,
    ) -> AttackResult<SignatureBuffer> {
        let quarter = params.code_n / 4;
        let mut vectors = Vec::with_capacity(options.signatures);
        for _ in 0..options.signatures {
            let c = bernoulli_bits(rng, quarter, 0.5);
            let d = bernoulli_bits(rng, quarter, options.fold_bias);
            let f = bernoulli_bits(rng, quarter, options.noise);
            let g = bernoulli_bits(rng, quarter, options.noise);
            let structured = plotkin(&plotkin(&c, &d), &plotkin(&f, &g));

            let mut packed = vec![0u8; params.error_bytes()];
            for (p, &s) in secret.as_slice().iter().enumerate() {
                if structured[s] {
                    packed[p / 8] |= 1 << (p % 8);
                }
            }
            vectors.push(packed);
        }
        SignatureBuffer::from_error_vectors(&vectors, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterSet;

    #[test]
    fn test_rm_dimensions() {
        assert_eq!(rm_generator(0, 4).rows(), 1);
        assert_eq!(rm_generator(1, 4).rows(), 5);
        assert_eq!(rm_generator(2, 4).rows(), 11);
        assert_eq!(rm_generator(2, 5).rows(), 16);
        assert_eq!(rm_generator(4, 4).rank(), 16);
        assert_eq!(rm_generator(2, 5).rank(), 16);
    }

    #[test]
    fn test_instance_is_consistent() {
        let params = CodeParameters::for_set(ParameterSet::Toy32);
        let options = SyntheticOptions {
            signatures: 16,
            ..SyntheticOptions::default()
        };
        let inst = SyntheticInstance::generate(&params, &options).unwrap();
        assert_eq!(inst.structured_generator.rows(), params.len_t());
        assert_eq!(inst.structured_generator.rank(), params.len_t());
        assert_eq!(
            inst.public_generator,
            inst.structured_generator.select_columns(inst.secret.as_slice())
        );
        assert_eq!(
            (inst.public_key.rows(), inst.public_key.cols()),
            (params.dim_t(), params.len_t())
        );
        assert_eq!(inst.signatures.len(), 16);

        let again = SyntheticInstance::generate(&params, &options).unwrap();
        assert_eq!(again.secret, inst.secret);
        assert_eq!(again.signatures, inst.signatures);
    }

    #[test]
    fn test_appended_rows_keep_rank_under_every_orientation() {
        let u = rm_generator(2, 4);
        let v = rm_generator(1, 4);

        // Right half inside U: swapping every twin leaves the row nothing.
        let mut left = BinaryMatrix::zeros(1, 16);
        left.set(0, 0, true);
        let sum = left.add(&u.row_range(0..1)).unwrap();
        assert!(!orientations_keep_rank(&u, &v, &left, &sum, 1));

        let params = CodeParameters::for_set(ParameterSet::Toy32);
        let inst = SyntheticInstance::generate(&params, &SyntheticOptions::default()).unwrap();
        let a = inst.structured_generator.row_range(0..params.k_app);
        let left = a.submatrix(0..params.k_app, 0..16);
        let sum = left.add(&a.submatrix(0..params.k_app, 16..32)).unwrap();
        assert!(orientations_keep_rank(&u, &v, &left, &sum, params.k_app));
    }

    #[test]
    fn test_affine_masks() {
        let masks = affine_masks(4);
        assert_eq!(masks.len(), 8);
        assert!(masks.contains(&0b0000));
        assert!(masks.contains(&0b1111));
        assert!(masks.contains(&0b1010));
        assert!(masks.contains(&0b0110));
    }

    #[test]
    fn test_full_size_children_are_rejected() {
        let params = CodeParameters::for_set(ParameterSet::Pqsigrm613);
        let err = SyntheticInstance::generate(&params, &SyntheticOptions::default()).unwrap_err();
        assert_eq!(err.error_code(), error_codes::UNSUPPORTED_SYNTHETIC_SHAPE);
    }
}
