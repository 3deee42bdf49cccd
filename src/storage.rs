//! Key, permutation and pair file formats
//!
//! All binary formats are raw little-endian dumps without headers:
//!
//! - public key: the `dim_t x len_t` block T of the systematic parity-check
//!   matrix, each row padded to a multiple of 64 bits, bits LSB-first
//! - permutation / secret key: `N` unsigned 16-bit entries
//! - matched pairs: text, one `i j` pair per line
//!
//! Reports are written as pretty-printed JSON.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{error_codes, AttackError, AttackResult};
use crate::gf2::BinaryMatrix;
use crate::params::CodeParameters;
use crate::permutation::Permutation;

fn file_label(path: &Path) -> String {
    path.display().to_string()
}

/// Padded row length of the public key, in bits
fn public_key_row_bits(params: &CodeParameters) -> usize {
    params.len_t().div_ceil(64) * 64
}

/// Decode the public key block T from its file contents
///
/// # Arguments
///
/// * `bytes` - Raw file contents
/// * `params` - Code parameters fixing the matrix shape
/// * `file` - Name used in error messages
///
/// # Returns
///
/// The `dim_t x len_t` matrix T, or a format error when the size is wrong
pub fn parse_public_key(
    bytes: &[u8],
    params: &CodeParameters,
    file: &str,
) -> AttackResult<BinaryMatrix> {
    let expected = params.public_key_bytes();
    if bytes.len() != expected {
        return Err(AttackError::format_error(
            file,
            &format!("{} bytes", expected),
            &format!("{} bytes", bytes.len()),
            error_codes::PUBLIC_KEY_SIZE_MISMATCH,
        ));
    }
    let row_bits = public_key_row_bits(params);
    let mut t = BinaryMatrix::zeros(params.dim_t(), params.len_t());
    for row in 0..params.dim_t() {
        for col in 0..params.len_t() {
            let pos = row * row_bits + col;
            if (bytes[pos / 8] >> (pos % 8)) & 1 == 1 {
                t.set(row, col, true);
            }
        }
    }
    Ok(t)
}

/// Read the public key block T from `path`
pub fn read_public_key(path: &Path, params: &CodeParameters) -> AttackResult<BinaryMatrix> {
    let bytes = fs::read(path)?;
    let t = parse_public_key(&bytes, params, &file_label(path))?;
    log::info!("Loaded public key {} ({}x{})", path.display(), t.rows(), t.cols());
    Ok(t)
}

/// Encode T in the padded public key layout
pub fn encode_public_key(t: &BinaryMatrix) -> Vec<u8> {
    let row_bits = t.cols().div_ceil(64) * 64;
    let mut bytes = vec![0u8; t.rows() * row_bits / 8];
    for row in 0..t.rows() {
        for col in 0..t.cols() {
            if t.get(row, col) {
                let pos = row * row_bits + col;
                bytes[pos / 8] |= 1 << (pos % 8);
            }
        }
    }
    bytes
}

pub fn write_public_key(path: &Path, t: &BinaryMatrix) -> AttackResult<()> {
    fs::write(path, encode_public_key(t))?;
    Ok(())
}

/// Decode `n` little-endian u16 entries into a permutation
pub fn parse_permutation(bytes: &[u8], n: usize, file: &str) -> AttackResult<Permutation> {
    if bytes.len() != 2 * n {
        return Err(AttackError::format_error(
            file,
            &format!("{} bytes", 2 * n),
            &format!("{} bytes", bytes.len()),
            error_codes::PERMUTATION_SIZE_MISMATCH,
        ));
    }
    let mut entries = vec![0u16; n];
    LittleEndian::read_u16_into(bytes, &mut entries);
    Permutation::from_u16s(&entries)
}

/// Read a permutation of length `n` written by [`write_permutation`]
pub fn read_permutation(path: &Path, n: usize) -> AttackResult<Permutation> {
    let bytes = fs::read(path)?;
    parse_permutation(&bytes, n, &file_label(path))
}

/// Write a permutation as `len` little-endian u16 entries
pub fn write_permutation(path: &Path, permutation: &Permutation) -> AttackResult<()> {
    let entries = permutation.to_u16s()?;
    let mut bytes = vec![0u8; 2 * entries.len()];
    LittleEndian::write_u16_into(&entries, &mut bytes);
    fs::write(path, bytes)?;
    log::info!("Wrote permutation of length {} to {}", entries.len(), path.display());
    Ok(())
}

/// The secret position map Q, wiped from memory on drop
///
/// Public position `p` carries structured column `Q[p]`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    entries: Vec<u16>,
}

impl SecretKey {
    /// Read the secret key of a code of length `params.code_n`
    pub fn from_file(path: &Path, params: &CodeParameters) -> AttackResult<Self> {
        let mut bytes = fs::read(path)?;
        let n = params.code_n;
        if bytes.len() != 2 * n {
            let actual = bytes.len();
            bytes.zeroize();
            return Err(AttackError::format_error(
                &file_label(path),
                &format!("{} bytes", 2 * n),
                &format!("{} bytes", actual),
                error_codes::PERMUTATION_SIZE_MISMATCH,
            ));
        }
        let mut entries = vec![0u16; n];
        LittleEndian::read_u16_into(&bytes, &mut entries);
        bytes.zeroize();
        let key = Self { entries };
        key.permutation()?;
        Ok(key)
    }

    pub fn from_permutation(q: &Permutation) -> AttackResult<Self> {
        Ok(Self {
            entries: q.to_u16s()?,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Q as a permutation
    pub fn permutation(&self) -> AttackResult<Permutation> {
        Permutation::from_u16s(&self.entries)
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// Parse matched pairs, one `i j` per line
///
/// Blank lines and lines starting with `#` are skipped. Pairs are stored
/// with the smaller index first.
pub fn parse_matched_pairs(
    text: &str,
    n: usize,
    file: &str,
) -> AttackResult<BTreeSet<(usize, usize)>> {
    let malformed = |line: usize, content: &str| {
        AttackError::format_error(
            file,
            &format!("two distinct indices below {} per line", n),
            &format!("line {}: '{}'", line, content),
            error_codes::MATCHED_PAIRS_MALFORMED,
        )
    };

    let mut pairs = BTreeSet::new();
    for (number, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let [a, b] = fields.as_slice() else {
            return Err(malformed(number + 1, trimmed));
        };
        let (Ok(a), Ok(b)) = (a.parse::<usize>(), b.parse::<usize>()) else {
            return Err(malformed(number + 1, trimmed));
        };
        if a == b || a >= n || b >= n {
            return Err(malformed(number + 1, trimmed));
        }
        pairs.insert((a.min(b), a.max(b)));
    }
    Ok(pairs)
}

pub fn read_matched_pairs(path: &Path, n: usize) -> AttackResult<BTreeSet<(usize, usize)>> {
    let text = fs::read_to_string(path)?;
    parse_matched_pairs(&text, n, &file_label(path))
}

/// Write pairs in the format [`parse_matched_pairs`] reads
pub fn write_matched_pairs(path: &Path, pairs: &[(usize, usize)]) -> AttackResult<()> {
    let text: String = pairs.iter().map(|(a, b)| format!("{} {}\n", a, b)).collect();
    fs::write(path, text)?;
    Ok(())
}

/// Write any serializable report as pretty JSON
pub fn write_report<T: Serialize>(path: &Path, report: &T) -> AttackResult<()> {
    let text = serde_json::to_string_pretty(report)?;
    fs::write(path, text)?;
    log::info!("Wrote report to {}", path.display());
    Ok(())
}
