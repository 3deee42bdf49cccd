//! Column permutations
//!
//! A permutation is stored as a gather array: applying `p` to a sequence `x`
//! yields `y[i] = x[p[i]]`. Selecting the columns of a generator matrix by
//! `p` therefore moves public column `p[i]` to position `i`.

use serde::{Deserialize, Serialize};

use crate::error::{error_codes, AttackError, AttackResult};

/// A bijection on `0..len`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permutation(Vec<usize>);

impl Permutation {
    /// Validate and wrap a gather array
    pub fn new(indices: Vec<usize>) -> AttackResult<Self> {
        let n = indices.len();
        let mut seen = vec![false; n];
        for (i, &v) in indices.iter().enumerate() {
            if v >= n {
                return Err(AttackError::invalid_permutation(
                    &format!("entry {} at position {} is out of range 0..{}", v, i, n),
                    error_codes::NOT_A_BIJECTION,
                ));
            }
            if seen[v] {
                return Err(AttackError::invalid_permutation(
                    &format!("entry {} appears twice", v),
                    error_codes::NOT_A_BIJECTION,
                ));
            }
            seen[v] = true;
        }
        Ok(Self(indices))
    }

    pub fn identity(n: usize) -> Self {
        Self((0..n).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<usize> {
        self.0
    }

    pub fn inverse(&self) -> Self {
        let mut inv = vec![0; self.0.len()];
        for (i, &v) in self.0.iter().enumerate() {
            inv[v] = i;
        }
        Self(inv)
    }

    /// Apply `self` and then `next`: `r[i] = self[next[i]]`
    pub fn then(&self, next: &Permutation) -> AttackResult<Self> {
        if next.len() != self.len() {
            return Err(AttackError::dimension_mismatch(
                "permutation composition",
                &format!("length {}", self.len()),
                &format!("length {}", next.len()),
            ));
        }
        Ok(Self(next.0.iter().map(|&j| self.0[j]).collect()))
    }

    /// Gather a sequence through this permutation
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        self.0.iter().map(|&j| items[j].clone()).collect()
    }

    /// Relabel each consecutive block of `refinement.len()` entries
    ///
    /// Block `b` of the result is block `b` of `self` gathered through
    /// `refinement`, so a block-local order is layered onto a coarser one.
    pub fn apply_blockwise(&self, refinement: &Permutation) -> AttackResult<Self> {
        let block = refinement.len();
        if block == 0 || self.len() % block != 0 {
            return Err(AttackError::dimension_mismatch(
                "blockwise permutation",
                &format!("a block length dividing {}", self.len()),
                &format!("block length {}", block),
            ));
        }
        let mut out = Vec::with_capacity(self.len());
        for chunk in self.0.chunks(block) {
            out.extend(refinement.0.iter().map(|&j| chunk[j]));
        }
        Ok(Self(out))
    }

    /// Entries as 16-bit values for the key file layout
    pub fn to_u16s(&self) -> AttackResult<Vec<u16>> {
        self.0
            .iter()
            .map(|&v| {
                u16::try_from(v).map_err(|_| {
                    AttackError::invalid_permutation(
                        &format!("entry {} does not fit in 16 bits", v),
                        error_codes::NOT_A_BIJECTION,
                    )
                })
            })
            .collect()
    }

    pub fn from_u16s(values: &[u16]) -> AttackResult<Self> {
        Self::new(values.iter().map(|&v| v as usize).collect())
    }
}

impl std::ops::Index<usize> for Permutation {
    type Output = usize;

    fn index(&self, i: usize) -> &usize {
        &self.0[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_bijection() {
        assert!(Permutation::new(vec![0, 2, 2]).is_err());
        assert!(Permutation::new(vec![0, 3, 1]).is_err());
        assert!(Permutation::new(vec![2, 0, 1]).is_ok());
    }

    #[test]
    fn test_inverse_and_then() {
        let p = Permutation::new(vec![2, 0, 3, 1]).unwrap();
        let inv = p.inverse();
        assert_eq!(p.then(&inv).unwrap(), Permutation::identity(4));
        assert_eq!(inv.then(&p).unwrap(), Permutation::identity(4));

        // Gathering twice equals gathering by the composition
        let q = Permutation::new(vec![1, 3, 0, 2]).unwrap();
        let items = ['a', 'b', 'c', 'd'];
        assert_eq!(q.apply(&p.apply(&items)), p.then(&q).unwrap().apply(&items));
    }

    #[test]
    fn test_apply_blockwise() {
        let coarse = Permutation::new(vec![7, 6, 5, 4, 3, 2, 1, 0]).unwrap();
        let fine = Permutation::new(vec![1, 0, 3, 2]).unwrap();
        let composed = coarse.apply_blockwise(&fine).unwrap();
        assert_eq!(composed.as_slice(), &[6, 7, 4, 5, 2, 3, 0, 1]);

        let bad = Permutation::identity(3);
        assert!(coarse.apply_blockwise(&bad).is_err());
    }

    #[test]
    fn test_u16_roundtrip() {
        let p = Permutation::new(vec![3, 1, 0, 2]).unwrap();
        let values = p.to_u16s().unwrap();
        assert_eq!(Permutation::from_u16s(&values).unwrap(), p);
    }
}
