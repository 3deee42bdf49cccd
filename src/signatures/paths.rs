//! U/V descent paths
//!
//! A path is a word over {U, V}; each symbol folds the population one level:
//! U keeps the AND of the two halves, V keeps their XOR.

use std::fmt;

use super::SignatureBuffer;
use crate::error::{error_codes, AttackError, AttackResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    U,
    V,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<Step>);

impl Path {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a word such as "UVU"
    pub fn parse(word: &str) -> AttackResult<Self> {
        word.chars()
            .map(|c| match c {
                'U' | 'u' => Ok(Step::U),
                'V' | 'v' => Ok(Step::V),
                other => Err(AttackError::InvalidParameter {
                    parameter: "path".to_string(),
                    expected: "a word over U and V".to_string(),
                    actual: other.to_string(),
                    error_code: error_codes::INVALID_PATH_SET,
                }),
            })
            .collect::<AttackResult<Vec<_>>>()
            .map(Self)
    }

    /// Fold a population along this path, starting at length 2^m
    ///
    /// Returns the working length after the last step. A path longer than
    /// `code_m` would fold past a single bit and is rejected.
    pub fn apply(&self, signatures: &mut SignatureBuffer, code_m: usize) -> AttackResult<usize> {
        check_path_len(self.len(), code_m)?;
        let mut m = code_m;
        for step in &self.0 {
            match step {
                Step::U => signatures.and_half(1 << m),
                Step::V => signatures.xor_half(1 << m),
            }
            m -= 1;
        }
        Ok(1 << m)
    }
}

/// Fail unless `len` folds fit in a code of length 2^code_m
pub fn check_path_len(len: usize, code_m: usize) -> AttackResult<()> {
    if len > code_m {
        return Err(AttackError::InvalidParameter {
            parameter: "path".to_string(),
            expected: format!("at most {} steps", code_m),
            actual: format!("{} steps", len),
            error_code: error_codes::INVALID_PATH_SET,
        });
    }
    Ok(())
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.0 {
            f.write_str(match step {
                Step::U => "U",
                Step::V => "V",
            })?;
        }
        Ok(())
    }
}

impl From<Vec<Step>> for Path {
    fn from(steps: Vec<Step>) -> Self {
        Self(steps)
    }
}

/// Lazily enumerate `start + w` for every start path and every word `w`
/// with exactly `u` U's and `v` V's
///
/// Words are produced in lexicographic order (U before V) for each start
/// path in turn. The iterator is cheap to clone, and a clone taken before
/// iteration replays the same sequence.
#[derive(Debug, Clone)]
pub struct UvPaths {
    starts: Vec<Path>,
    u: usize,
    v: usize,
    start_index: usize,
    current: Option<Vec<Step>>,
}

impl UvPaths {
    pub fn new(starts: Vec<Path>, u: usize, v: usize) -> Self {
        let mut paths = Self {
            starts,
            u,
            v,
            start_index: 0,
            current: None,
        };
        paths.restart();
        paths
    }

    /// Rewind to the first path
    pub fn restart(&mut self) {
        self.start_index = 0;
        self.current = if self.starts.is_empty() {
            None
        } else {
            Some(self.first_word())
        };
    }

    /// Total number of paths
    pub fn count_paths(&self) -> usize {
        self.starts.len() * binomial(self.u + self.v, self.u)
    }

    /// Length of every produced path, if all start paths agree
    pub fn path_len(&self) -> AttackResult<usize> {
        let Some(first) = self.starts.first() else {
            return Ok(self.u + self.v);
        };
        if self.starts.iter().any(|p| p.len() != first.len()) {
            return Err(AttackError::InvalidParameter {
                parameter: "start paths".to_string(),
                expected: "paths of equal length".to_string(),
                actual: self
                    .starts
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
                error_code: error_codes::INVALID_PATH_SET,
            });
        }
        Ok(first.len() + self.u + self.v)
    }

    fn first_word(&self) -> Vec<Step> {
        let mut word = vec![Step::U; self.u];
        word.extend(std::iter::repeat(Step::V).take(self.v));
        word
    }
}

/// Advance to the next multiset permutation in lexicographic order
fn next_word(word: &mut [Step]) -> bool {
    let n = word.len();
    if n < 2 {
        return false;
    }
    let Some(i) = (0..n - 1).rev().find(|&i| word[i] < word[i + 1]) else {
        return false;
    };
    let j = (i + 1..n).rev().find(|&j| word[j] > word[i]).unwrap_or(i + 1);
    word.swap(i, j);
    word[i + 1..].reverse();
    true
}

fn binomial(n: usize, k: usize) -> usize {
    let k = k.min(n - k);
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

impl Iterator for UvPaths {
    type Item = Path;

    fn next(&mut self) -> Option<Path> {
        let word = self.current.as_mut()?;
        let mut path = self.starts[self.start_index].0.clone();
        path.extend_from_slice(word);

        if !next_word(word) {
            self.start_index += 1;
            self.current = if self.start_index < self.starts.len() {
                Some(self.first_word())
            } else {
                None
            };
        }
        Some(Path(path))
    }
}
