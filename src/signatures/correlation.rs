//! Pearson correlation between error-vector positions
//!
//! Samples are accumulated in the +/-1 encoding X = 1 - 2e, where the
//! coefficient is the same as for the {0,1} values.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::SignatureBuffer;
use crate::error::{error_codes, AttackError, AttackResult};

/// Symmetric L x L matrix of Pearson coefficients with unit diagonal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    size: usize,
    values: Vec<f64>,
}

impl CorrelationMatrix {
    /// Build from a full row-major table
    pub fn from_values(size: usize, values: Vec<f64>) -> AttackResult<Self> {
        if values.len() != size * size {
            return Err(AttackError::dimension_mismatch(
                "correlation matrix",
                &format!("{} entries", size * size),
                &format!("{} entries", values.len()),
            ));
        }
        Ok(Self { size, values })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }
}

/// Incremental sufficient statistics for a correlation matrix
///
/// Any number of populations can be fed through [`Correlation::update`];
/// the order of updates does not change the result.
#[derive(Debug, Clone)]
pub struct Correlation {
    size: usize,
    samples: u64,
    sum_x: Vec<i64>,
    sum_xy: Vec<i64>,
}

#[inline]
fn pair_index(size: usize, j: usize, k: usize) -> usize {
    debug_assert!(j < k);
    j * size - j * (j + 1) / 2 + (k - j - 1)
}

impl Correlation {
    /// Accumulator over the leading `size` positions
    pub fn new(size: usize) -> Self {
        Self {
            size,
            samples: 0,
            sum_x: vec![0; size],
            sum_xy: vec![0; size * size.saturating_sub(1) / 2],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of records accumulated so far
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Add every record of a population
    pub fn update(&mut self, signatures: &SignatureBuffer) -> AttackResult<()> {
        if self.size > signatures.bit_len() {
            return Err(AttackError::dimension_mismatch(
                "correlation update",
                &format!("at least {} bits per record", self.size),
                &format!("{} bits", signatures.bit_len()),
            ));
        }
        let size = self.size;
        let pairs = self.sum_xy.len();
        // One table per worker: each holds size * (size - 1) / 2 counters.
        let per_worker = signatures.len().div_ceil(rayon::current_num_threads()).max(1);

        let totals = signatures
            .par_error_vectors()
            .with_min_len(per_worker)
            .fold(
                || (vec![0i64; size], vec![0i64; pairs]),
                |(mut sx, mut sxy), bits| {
                    let e: Vec<bool> = (0..size)
                        .map(|j| (bits[j / 8] >> (j % 8)) & 1 == 1)
                        .collect();
                    let mut idx = 0;
                    for j in 0..size {
                        sx[j] += if e[j] { -1 } else { 1 };
                        for k in j + 1..size {
                            sxy[idx] += if e[j] ^ e[k] { -1 } else { 1 };
                            idx += 1;
                        }
                    }
                    (sx, sxy)
                },
            )
            .reduce_with(|(mut ax, mut axy), (bx, bxy)| {
                ax.iter_mut().zip(&bx).for_each(|(a, b)| *a += b);
                axy.iter_mut().zip(&bxy).for_each(|(a, b)| *a += b);
                (ax, axy)
            });

        let Some((sum_x, sum_xy)) = totals else {
            return Ok(());
        };
        self.sum_x.iter_mut().zip(&sum_x).for_each(|(a, b)| *a += b);
        self.sum_xy.iter_mut().zip(&sum_xy).for_each(|(a, b)| *a += b);
        self.samples += signatures.len() as u64;
        Ok(())
    }

    /// Turn the statistics into Pearson coefficients
    ///
    /// Positions with zero variance correlate with nothing (coefficient 0).
    pub fn finish(&self) -> AttackResult<CorrelationMatrix> {
        if self.samples == 0 {
            return Err(AttackError::InvalidParameter {
                parameter: "signatures".to_string(),
                expected: "at least one record".to_string(),
                actual: "0".to_string(),
                error_code: error_codes::EMPTY_POPULATION,
            });
        }
        let n = self.samples as f64;
        let size = self.size;
        let mean: Vec<f64> = self.sum_x.iter().map(|&s| s as f64 / n).collect();
        let deviation: Vec<f64> = mean
            .iter()
            .map(|m| (1.0 - m * m).max(0.0).sqrt())
            .collect();

        let mut values = vec![0.0; size * size];
        for j in 0..size {
            values[j * size + j] = 1.0;
            for k in j + 1..size {
                let denom = deviation[j] * deviation[k];
                let rho = if denom <= 1e-12 {
                    0.0
                } else {
                    let exy = self.sum_xy[pair_index(size, j, k)] as f64 / n;
                    ((exy - mean[j] * mean[k]) / denom).clamp(-1.0, 1.0)
                };
                values[j * size + k] = rho;
                values[k * size + j] = rho;
            }
        }
        CorrelationMatrix::from_values(size, values)
    }
}
