//! Owned signature populations

use std::path::Path;

use rayon::prelude::*;

use crate::error::{error_codes, AttackError, AttackResult};
use crate::params::CodeParameters;

/// A population of signed-message records held in one buffer
///
/// Each record is `stride` bytes; the error vector of a record starts at
/// `error_offset` and spans `error_bytes` bytes. Bit `j` of an error vector
/// is bit `j % 8` of byte `j / 8`. Records are only reached through bounds
/// checked slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBuffer {
    data: Vec<u8>,
    stride: usize,
    error_offset: usize,
    error_bytes: usize,
}

impl SignatureBuffer {
    /// Wrap raw file contents
    pub fn from_bytes(data: Vec<u8>, params: &CodeParameters, file: &str) -> AttackResult<Self> {
        let stride = params.record_len();
        if data.is_empty() || data.len() % stride != 0 {
            return Err(AttackError::format_error(
                file,
                &format!("a non-zero multiple of {} bytes", stride),
                &format!("{} bytes", data.len()),
                error_codes::SIGNATURE_SIZE_MISMATCH,
            ));
        }
        Ok(Self {
            data,
            stride,
            error_offset: params.error_offset(),
            error_bytes: params.error_bytes(),
        })
    }

    /// Read a signature file
    pub fn from_file(path: &Path, params: &CodeParameters) -> AttackResult<Self> {
        let data = std::fs::read(path)?;
        let buffer = Self::from_bytes(data, params, &path.display().to_string())?;
        log::info!(
            "Loaded {} signatures from {}",
            buffer.len(),
            path.display()
        );
        Ok(buffer)
    }

    /// Build records around packed error vectors
    ///
    /// The length field holds the message length and the message and salt
    /// bytes stay zero; only the error vector matters to the attack.
    pub fn from_error_vectors(vectors: &[Vec<u8>], params: &CodeParameters) -> AttackResult<Self> {
        let stride = params.record_len();
        let offset = params.error_offset();
        let error_bytes = params.error_bytes();
        let mut data = vec![0u8; vectors.len() * stride];
        for (record, vector) in data.chunks_mut(stride).zip(vectors) {
            if vector.len() != error_bytes {
                return Err(AttackError::dimension_mismatch(
                    "error vector",
                    &format!("{} bytes", error_bytes),
                    &format!("{} bytes", vector.len()),
                ));
            }
            record[..8].copy_from_slice(&(params.mlen as u64).to_le_bytes());
            record[offset..offset + error_bytes].copy_from_slice(vector);
        }
        Self::from_bytes(data, params, "<memory>")
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.data.len() / self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Error vector length in bits
    pub fn bit_len(&self) -> usize {
        self.error_bytes * 8
    }

    /// The error vector of record `index`
    pub fn error_vector(&self, index: usize) -> &[u8] {
        let start = index * self.stride + self.error_offset;
        &self.data[start..start + self.error_bytes]
    }

    /// Bit `bit` of record `index`
    pub fn bit(&self, index: usize, bit: usize) -> bool {
        (self.error_vector(index)[bit / 8] >> (bit % 8)) & 1 == 1
    }

    /// Raw bytes, used for cache keys and file output
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Run `f` on every error vector in parallel
    pub(crate) fn par_error_vectors_mut<F>(&mut self, f: F)
    where
        F: Fn(&mut [u8]) + Sync + Send,
    {
        let (offset, len) = (self.error_offset, self.error_bytes);
        self.data
            .par_chunks_mut(self.stride)
            .for_each(|record| f(&mut record[offset..offset + len]));
    }

    /// Parallel iterator over the error vectors
    pub(crate) fn par_error_vectors(&self) -> impl IndexedParallelIterator<Item = &[u8]> {
        let (offset, len) = (self.error_offset, self.error_bytes);
        self.data
            .par_chunks(self.stride)
            .map(move |record| &record[offset..offset + len])
    }
}
