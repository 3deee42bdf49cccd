//! Target code parameter sets and recovery tunables
//!
//! The code shape is fixed before any recovery call and is passed explicitly
//! to every stage; nothing here is global state.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{error_codes, AttackError, AttackResult};

/// Built-in parameter sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterSet {
    /// Length 8192 code, RM(6,12) and RM(5,12) children with two appended rows
    Pqsigrm613,
    /// Length 32 toy code with the same two-level shape, for tests
    Toy32,
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterSet::Pqsigrm613 => write!(f, "pqsigrm-6-13"),
            ParameterSet::Toy32 => write!(f, "toy-32"),
        }
    }
}

/// Recursion depth of the decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Depth {
    /// Top-level U|U+V split of the full code
    One,
    /// Split of the U child found at depth one
    Two,
}

/// Parameters of the attacked code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeParameters {
    /// Code length N = 2^m
    pub code_n: usize,

    /// Nominal code dimension K; the public generator has K + 1 rows
    pub code_k: usize,

    /// Reed-Muller order r
    pub code_r: usize,

    /// Reed-Muller log-length m
    pub code_m: usize,

    /// Number of appended rows outside the U|U+V structure
    pub k_app: usize,

    /// Dimension of the U child
    pub dim_u: usize,

    /// Dimension of the V child
    pub dim_v: usize,

    /// Message length in bytes inside a signed-message record
    pub mlen: usize,
}

impl CodeParameters {
    /// Get parameters for a built-in set
    pub fn for_set(set: ParameterSet) -> Self {
        match set {
            ParameterSet::Pqsigrm613 => Self {
                code_n: 8192,
                code_k: 4096,
                code_r: 6,
                code_m: 13,
                k_app: 2,
                dim_u: 2508,
                dim_v: 1587,
                mlen: 32,
            },
            ParameterSet::Toy32 => Self {
                code_n: 32,
                code_k: 17,
                code_r: 2,
                code_m: 5,
                k_app: 2,
                dim_u: 11,
                dim_v: 5,
                mlen: 32,
            },
        }
    }

    /// Load parameters from a JSON file and validate them
    pub fn from_json_file(path: &Path) -> AttackResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    /// Check the relations between the fields
    pub fn validate(&self) -> AttackResult<()> {
        let invalid = |parameter: &str, expected: String, actual: String| {
            Err(AttackError::InvalidParameter {
                parameter: parameter.to_string(),
                expected,
                actual,
                error_code: error_codes::INVALID_CODE_PARAMETERS,
            })
        };

        if self.code_m < 3 || self.code_m >= usize::BITS as usize {
            return invalid("code_m", "3 <= m < word size".to_string(), self.code_m.to_string());
        }
        if self.code_n != 1 << self.code_m {
            return invalid(
                "code_n",
                format!("2^{} = {}", self.code_m, 1usize << self.code_m),
                self.code_n.to_string(),
            );
        }
        if self.code_n % 8 != 0 {
            return invalid("code_n", "a multiple of 8".to_string(), self.code_n.to_string());
        }
        if self.code_n > u16::MAX as usize + 1 {
            return invalid(
                "code_n",
                "at most 65536 so positions fit in 16 bits".to_string(),
                self.code_n.to_string(),
            );
        }
        if self.code_k + 1 >= self.code_n {
            return invalid(
                "code_k",
                format!("less than {}", self.code_n - 1),
                self.code_k.to_string(),
            );
        }
        if self.dim_u + self.dim_v + self.k_app != self.len_t() {
            return invalid(
                "dim_u + dim_v + k_app",
                format!("{}", self.len_t()),
                format!("{}", self.dim_u + self.dim_v + self.k_app),
            );
        }
        if self.code_r == 0 || self.code_r >= self.code_m {
            return invalid(
                "code_r",
                format!("0 < r < {}", self.code_m),
                self.code_r.to_string(),
            );
        }
        Ok(())
    }

    /// Half length R of the top-level split
    pub fn half(&self) -> usize {
        self.code_n / 2
    }

    /// Rows of the public key block T
    pub fn dim_t(&self) -> usize {
        self.code_n - self.code_k - 1
    }

    /// Columns of the public key block T, which is also the generator row count
    pub fn len_t(&self) -> usize {
        self.code_k + 1
    }

    /// Rows of the parity-check matrix H = [I | T]
    pub fn len_h(&self) -> usize {
        self.dim_t() + self.len_t()
    }

    /// Signature payload bytes: 64-bit header, error vector, 64-bit salt
    pub fn crypto_bytes(&self) -> usize {
        (64 + self.code_n + 64) / 8
    }

    /// Stride of one signed-message record
    pub fn record_len(&self) -> usize {
        self.mlen + self.crypto_bytes()
    }

    /// Byte offset of the error vector inside a record
    pub fn error_offset(&self) -> usize {
        8 + self.mlen
    }

    /// Error vector length in bytes
    pub fn error_bytes(&self) -> usize {
        self.code_n / 8
    }

    /// Public key file size in bytes (rows padded to 64-bit words)
    pub fn public_key_bytes(&self) -> usize {
        self.dim_t() * self.len_t().div_ceil(64) * 8
    }

    /// Expected number of appended rows left after correction at a depth
    pub fn appended_dimension(&self, depth: Depth) -> usize {
        match depth {
            Depth::One => self.k_app,
            Depth::Two => 0,
        }
    }
}

impl Default for CodeParameters {
    fn default() -> Self {
        Self::for_set(ParameterSet::Pqsigrm613)
    }
}

/// Tunables for the recovery driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Upper bound on swap-correction rounds per level
    pub max_correction_rounds: usize,

    /// Number of kernel rows stacked into one joint swap solve
    pub joint_solve_rows: usize,

    /// Directory for cached correlation matrices
    pub cache_dir: Option<std::path::PathBuf>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_correction_rounds: 256,
            joint_solve_rows: 64,
            cache_dir: None,
        }
    }
}

impl RecoveryConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: &Path) -> AttackResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        if config.max_correction_rounds == 0 {
            return Err(AttackError::InvalidParameter {
                parameter: "max_correction_rounds".to_string(),
                expected: "at least 1".to_string(),
                actual: "0".to_string(),
                error_code: error_codes::INVALID_CONFIG,
            });
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sets_are_consistent() {
        for set in [ParameterSet::Pqsigrm613, ParameterSet::Toy32] {
            let params = CodeParameters::for_set(set);
            assert!(params.validate().is_ok(), "{} failed validation", set);
            assert_eq!(params.dim_t() + params.len_t(), params.code_n);
        }
    }

    #[test]
    fn test_pqsigrm_layout() {
        let params = CodeParameters::for_set(ParameterSet::Pqsigrm613);
        assert_eq!(params.crypto_bytes(), 1040);
        assert_eq!(params.record_len(), 1072);
        assert_eq!(params.error_offset(), 40);
        assert_eq!(params.dim_t(), 4095);
        assert_eq!(params.len_t(), 4097);
        assert_eq!(params.public_key_bytes(), 4095 * 65 * 8);
        assert_eq!(params.appended_dimension(Depth::One), 2);
        assert_eq!(params.appended_dimension(Depth::Two), 0);
    }

    #[test]
    fn test_validation_rejects_bad_length() {
        let mut params = CodeParameters::for_set(ParameterSet::Toy32);
        params.code_n = 48;
        assert!(params.validate().is_err());

        let mut params = CodeParameters::for_set(ParameterSet::Toy32);
        params.dim_v += 1;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: RecoveryConfig = serde_json::from_str(r#"{"joint_solve_rows": 8}"#).unwrap();
        assert_eq!(config.joint_solve_rows, 8);
        assert_eq!(config.max_correction_rounds, 256);
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn test_parameters_json_roundtrip() {
        let params = CodeParameters::for_set(ParameterSet::Toy32);
        let text = serde_json::to_string(&params).unwrap();
        let back: CodeParameters = serde_json::from_str(&text).unwrap();
        assert_eq!(back, params);
    }
}
