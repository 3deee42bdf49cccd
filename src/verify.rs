//! Checking a recovered permutation against a known secret key
//!
//! With the secret key Q (public position -> structured column) and a
//! recovered layout P (public column -> recovered position), structured
//! column `i` lands at recovered position `P[Q^-1[i]]`.

use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{AttackError, AttackResult};
use crate::permutation::Permutation;
use crate::signatures::SignatureBuffer;

/// Result of the strict top-level check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UuvCheck {
    /// The first half of the structured columns fills the first recovered half
    pub lower_half_ok: bool,
    /// The second half of the structured columns fills the second recovered half
    pub upper_half_ok: bool,
    /// Structured twins `(i, i + N/2)` that sit exactly `N/2` apart
    pub aligned_pairs: usize,
    pub total_pairs: usize,
}

impl UuvCheck {
    pub fn passed(&self) -> bool {
        self.lower_half_ok && self.upper_half_ok && self.aligned_pairs == self.total_pairs
    }
}

/// Result of the orientation-free twin check at one block size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TwinCheck {
    pub block: usize,
    pub checked: usize,
    pub aligned: usize,
}

impl TwinCheck {
    pub fn passed(&self) -> bool {
        self.checked == self.aligned
    }
}

fn same_length(q: &Permutation, p: &Permutation) -> AttackResult<()> {
    if q.len() != p.len() {
        return Err(AttackError::dimension_mismatch(
            "permutation check",
            &format!("length {}", q.len()),
            &format!("length {}", p.len()),
        ));
    }
    Ok(())
}

/// Recovered position of every structured column
fn positions(q: &Permutation, p_layout: &Permutation) -> Vec<usize> {
    q.inverse().as_slice().iter().map(|&public| p_layout[public]).collect()
}

/// Strict check that the recovered order reproduces the (u, u + v) split
///
/// Every U column must land in the first half and every U+V column in the
/// second half, each at the same offset as its twin.
pub fn check_u_uv_permutation(q: &Permutation, p_layout: &Permutation) -> AttackResult<UuvCheck> {
    same_length(q, p_layout)?;
    let pos = positions(q, p_layout);
    let half = pos.len() / 2;

    let lower_half_ok = pos[..half].iter().all(|&x| x < half);
    let upper_half_ok = pos[half..].iter().all(|&x| x >= half);
    let aligned_pairs = (0..half).filter(|&i| pos[i + half] == pos[i] + half).count();

    Ok(UuvCheck {
        lower_half_ok,
        upper_half_ok,
        aligned_pairs,
        total_pairs: half,
    })
}

/// Check that twins at distance `block` stay `block` apart
///
/// Positions are compared modulo `2 * block`, so a twin pair passes whether
/// or not its orientation (or that of an enclosing level) was flipped.
pub fn check_twin_structure(
    q: &Permutation,
    p_layout: &Permutation,
    block: usize,
) -> AttackResult<TwinCheck> {
    same_length(q, p_layout)?;
    if !block.is_power_of_two() || 2 * block > q.len() {
        return Err(AttackError::invalid_parameter(
            "block",
            &format!("a power of two at most {}", q.len() / 2),
            &block.to_string(),
        ));
    }
    let pos = positions(q, p_layout);
    let span = 2 * block;
    let mut checked = 0;
    let mut aligned = 0;
    for i in (0..pos.len()).filter(|&i| i & block == 0) {
        checked += 1;
        if (pos[i] % span).abs_diff(pos[i + block] % span) == block {
            aligned += 1;
        }
    }
    Ok(TwinCheck {
        block,
        checked,
        aligned,
    })
}

/// Number of `pairs` (public positions) that are true top-level twins
pub fn count_good_matched_pairs(q: &Permutation, pairs: &BTreeSet<(usize, usize)>) -> usize {
    let qinv = q.inverse();
    let half = q.len() / 2;
    (0..half)
        .filter(|&i| {
            let (a, b) = (qinv[i], qinv[i + half]);
            pairs.contains(&(a.min(b), a.max(b)))
        })
        .count()
}

/// Pair every position with the one it disagrees with least often
///
/// Only the first `len` positions of each error vector are used; ties go to
/// the smaller index. The result has one entry per position and need not
/// be a matching.
pub fn matched_pairs_by_agreement(
    signatures: &SignatureBuffer,
    len: usize,
) -> AttackResult<Vec<(usize, usize)>> {
    if len < 2 || len > signatures.bit_len() {
        return Err(AttackError::invalid_parameter(
            "length",
            &format!("between 2 and {}", signatures.bit_len()),
            &len.to_string(),
        ));
    }
    let words = signatures.len().div_ceil(64);
    let mut columns = vec![vec![0u64; words]; len];
    for s in 0..signatures.len() {
        for (j, column) in columns.iter_mut().enumerate() {
            if signatures.bit(s, j) {
                column[s / 64] |= 1 << (s % 64);
            }
        }
    }

    let pairs = (0..len)
        .into_par_iter()
        .map(|i| {
            let mut best = (u32::MAX, i);
            for j in (0..len).filter(|&j| j != i) {
                let distance: u32 = columns[i]
                    .iter()
                    .zip(&columns[j])
                    .map(|(a, b)| (a ^ b).count_ones())
                    .sum();
                if distance < best.0 {
                    best = (distance, j);
                }
            }
            (i, best.1)
        })
        .collect();
    Ok(pairs)
}
