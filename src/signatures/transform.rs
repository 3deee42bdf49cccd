//! Bit transforms applied to every error vector of a population
//!
//! The AND-half and XOR-half folds invert one level of the (u, u+v)
//! construction on the leading `len` bits. Bits at `len` and beyond are left
//! untouched.

use super::SignatureBuffer;
use crate::permutation::Permutation;

#[inline]
fn get(bits: &[u8], j: usize) -> bool {
    (bits[j / 8] >> (j % 8)) & 1 == 1
}

#[inline]
fn put(bits: &mut [u8], j: usize, value: bool) {
    let mask = 1u8 << (j % 8);
    if value {
        bits[j / 8] |= mask;
    } else {
        bits[j / 8] &= !mask;
    }
}

/// e[j] &= e[j + len/2] for j < len/2
pub fn and_half_bits(bits: &mut [u8], len: usize) {
    let half = len / 2;
    if half % 8 == 0 {
        let (lo, hi) = bits.split_at_mut(half / 8);
        for (a, b) in lo.iter_mut().zip(&hi[..half / 8]) {
            *a &= *b;
        }
    } else {
        for j in 0..half {
            let v = get(bits, j) & get(bits, j + half);
            put(bits, j, v);
        }
    }
}

/// e[j] ^= e[j + len/2] for j < len/2
pub fn xor_half_bits(bits: &mut [u8], len: usize) {
    let half = len / 2;
    if half % 8 == 0 {
        let (lo, hi) = bits.split_at_mut(half / 8);
        for (a, b) in lo.iter_mut().zip(&hi[..half / 8]) {
            *a ^= *b;
        }
    } else {
        for j in 0..half {
            let v = get(bits, j) ^ get(bits, j + half);
            put(bits, j, v);
        }
    }
}

/// e'[j] = e[p[j]] for j < len(p)
pub fn permute_bits(bits: &mut [u8], permutation: &[usize]) {
    let gathered: Vec<bool> = permutation.iter().map(|&src| get(bits, src)).collect();
    for (j, v) in gathered.into_iter().enumerate() {
        put(bits, j, v);
    }
}

impl SignatureBuffer {
    /// Fold every record with an AND of its two `len/2` halves
    pub fn and_half(&mut self, len: usize) {
        debug_assert!(len <= self.bit_len() && len % 2 == 0);
        self.par_error_vectors_mut(|bits| and_half_bits(bits, len));
    }

    /// Fold every record with a XOR of its two `len/2` halves
    pub fn xor_half(&mut self, len: usize) {
        debug_assert!(len <= self.bit_len() && len % 2 == 0);
        self.par_error_vectors_mut(|bits| xor_half_bits(bits, len));
    }

    /// Relabel the leading `permutation.len()` bits of every record
    pub fn apply_bitwise_permutation(&mut self, permutation: &Permutation) {
        debug_assert!(permutation.len() <= self.bit_len());
        let p = permutation.as_slice();
        self.par_error_vectors_mut(|bits| permute_bits(bits, p));
    }
}
