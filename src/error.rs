/*!
 * Error Handling for the Permutation Recovery Pipeline
 *
 * Provides error types with error codes, user-friendly messages and
 * suggested remediation for every fallible stage of the attack: reading
 * key and signature files, validating parameters and permutations, and
 * the swap correction loop.
 */

use std::collections::HashMap;
use thiserror::Error;

/// Error type for all recovery operations
#[derive(Debug, Error)]
pub enum AttackError {
    #[error("Malformed input file {file}: expected {expected}, got {actual}")]
    FormatError {
        file: String,
        expected: String,
        actual: String,
        error_code: u32,
    },

    #[error("Invalid parameter: {parameter} - {expected} - got {actual}")]
    InvalidParameter {
        parameter: String,
        expected: String,
        actual: String,
        error_code: u32,
    },

    #[error("Dimension mismatch in {operation}: expected {expected}, got {actual}")]
    DimensionMismatch {
        operation: String,
        expected: String,
        actual: String,
        error_code: u32,
    },

    #[error("Invalid permutation: {cause}")]
    InvalidPermutation { cause: String, error_code: u32 },

    #[error(
        "Swap correction failed at half-length {half_length}: offending rank {offending_rank}, target {target_rank} after {rounds} rounds"
    )]
    CorrectionFailed {
        half_length: usize,
        offending_rank: usize,
        target_rank: usize,
        rounds: usize,
        error_code: u32,
    },

    #[error("Synthetic instance generation failed: {cause}")]
    GenerationError { cause: String, error_code: u32 },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Error code constants for different error categories
pub mod error_codes {
    // Input format errors: 1000-1999
    pub const PUBLIC_KEY_SIZE_MISMATCH: u32 = 1001;
    pub const PERMUTATION_SIZE_MISMATCH: u32 = 1002;
    pub const SIGNATURE_SIZE_MISMATCH: u32 = 1003;
    pub const MATCHED_PAIRS_MALFORMED: u32 = 1004;

    // Parameter errors: 2000-2999
    pub const INVALID_CODE_PARAMETERS: u32 = 2001;
    pub const INVALID_PATH_SET: u32 = 2002;
    pub const EMPTY_POPULATION: u32 = 2003;
    pub const INVALID_CONFIG: u32 = 2004;

    // Linear algebra errors: 3000-3999
    pub const SHAPE_MISMATCH: u32 = 3001;
    pub const ODD_COLUMN_COUNT: u32 = 3002;

    // Recovery errors: 4000-4999
    pub const NOT_A_BIJECTION: u32 = 4001;
    pub const INCOMPLETE_MATCHING: u32 = 4002;
    pub const CORRECTION_ROUND_LIMIT: u32 = 4003;
    pub const CORRECTION_NO_PROGRESS: u32 = 4004;
    pub const CORRECTION_BELOW_TARGET: u32 = 4005;

    // Synthetic instance errors: 5000-5999
    pub const UNSUPPORTED_SYNTHETIC_SHAPE: u32 = 5001;
    pub const SYSTEMATIC_FORM_NOT_FOUND: u32 = 5002;

    // Serialization and IO: 9000-9999
    pub const SERIALIZATION_FAILED: u32 = 9001;
    pub const IO_FAILED: u32 = 9002;
}

impl AttackError {
    /// Get the numeric error code for this error
    pub fn error_code(&self) -> u32 {
        match self {
            AttackError::FormatError { error_code, .. } => *error_code,
            AttackError::InvalidParameter { error_code, .. } => *error_code,
            AttackError::DimensionMismatch { error_code, .. } => *error_code,
            AttackError::InvalidPermutation { error_code, .. } => *error_code,
            AttackError::CorrectionFailed { error_code, .. } => *error_code,
            AttackError::GenerationError { error_code, .. } => *error_code,
            AttackError::SerializationError(_) => error_codes::SERIALIZATION_FAILED,
            AttackError::IoError(_) => error_codes::IO_FAILED,
        }
    }

    /// Get a user-friendly error message
    pub fn user_friendly_message(&self) -> String {
        match self {
            AttackError::FormatError { file, expected, .. } => {
                format!(
                    "Input file '{}' has the wrong layout. Expected {}.",
                    file, expected
                )
            }
            AttackError::InvalidParameter {
                parameter,
                expected,
                ..
            } => {
                format!(
                    "Invalid parameter '{}'. Expected {}.",
                    parameter, expected
                )
            }
            AttackError::DimensionMismatch { operation, .. } => {
                format!(
                    "Matrix shapes do not agree in '{}'. The inputs belong to different codes.",
                    operation
                )
            }
            AttackError::InvalidPermutation { .. } => {
                "A permutation is not a bijection. Check the key or permutation file.".to_string()
            }
            AttackError::CorrectionFailed {
                half_length,
                offending_rank,
                target_rank,
                ..
            } => {
                format!(
                    "Could not align the twin columns at half-length {} (rank {} left, {} expected). The pairing is probably wrong.",
                    half_length, offending_rank, target_rank
                )
            }
            AttackError::GenerationError { .. } => {
                "Synthetic instance generation failed. Try another seed.".to_string()
            }
            AttackError::SerializationError(_) => {
                "Data serialization failed. Data format may be corrupted.".to_string()
            }
            AttackError::IoError(_) => {
                "Input/output operation failed. Check file permissions and disk space.".to_string()
            }
        }
    }

    /// Get technical details for debugging
    pub fn technical_details(&self) -> HashMap<String, String> {
        let mut details = HashMap::new();

        details.insert("error_code".to_string(), self.error_code().to_string());
        details.insert("error_type".to_string(), self.error_type().to_string());
        details.insert("timestamp".to_string(), chrono::Utc::now().to_rfc3339());

        match self {
            AttackError::FormatError {
                file,
                expected,
                actual,
                ..
            } => {
                details.insert("file".to_string(), file.clone());
                details.insert("expected".to_string(), expected.clone());
                details.insert("actual".to_string(), actual.clone());
            }
            AttackError::InvalidParameter {
                parameter,
                expected,
                actual,
                ..
            } => {
                details.insert("parameter".to_string(), parameter.clone());
                details.insert("expected".to_string(), expected.clone());
                details.insert("actual".to_string(), actual.clone());
            }
            AttackError::CorrectionFailed {
                half_length,
                offending_rank,
                target_rank,
                rounds,
                ..
            } => {
                details.insert("half_length".to_string(), half_length.to_string());
                details.insert("offending_rank".to_string(), offending_rank.to_string());
                details.insert("target_rank".to_string(), target_rank.to_string());
                details.insert("rounds".to_string(), rounds.to_string());
            }
            _ => {
                details.insert("details".to_string(), format!("{:?}", self));
            }
        }

        details
    }

    /// Get suggested remediation steps
    pub fn suggested_remediation(&self) -> Option<String> {
        match self {
            AttackError::FormatError { error_code, .. } => match *error_code {
                error_codes::SIGNATURE_SIZE_MISMATCH => Some(
                    "Signature files must be a whole number of signed-message records. Check the MLEN and code length parameters."
                        .to_string(),
                ),
                error_codes::PUBLIC_KEY_SIZE_MISMATCH => Some(
                    "Check that the public key was produced for the selected parameter set."
                        .to_string(),
                ),
                _ => Some("Regenerate the file or pick the matching parameter set.".to_string()),
            },
            AttackError::CorrectionFailed { error_code, .. } => match *error_code {
                error_codes::CORRECTION_ROUND_LIMIT => Some(
                    "Raise max_correction_rounds in the recovery configuration.".to_string(),
                ),
                error_codes::CORRECTION_BELOW_TARGET => Some(
                    "Check k_app: the generator has fewer appended rows than the parameters claim."
                        .to_string(),
                ),
                _ => Some(
                    "Collect more signatures so the correlation pairing becomes reliable."
                        .to_string(),
                ),
            },
            AttackError::InvalidParameter { .. } => Some(
                "Use one of the built-in parameter sets or fix the JSON parameter file."
                    .to_string(),
            ),
            AttackError::GenerationError { .. } => {
                Some("Retry with a different seed.".to_string())
            }
            _ => None,
        }
    }

    /// Get the error category/type as a string
    pub fn error_type(&self) -> &'static str {
        match self {
            AttackError::FormatError { .. } => "FormatError",
            AttackError::InvalidParameter { .. } => "InvalidParameter",
            AttackError::DimensionMismatch { .. } => "DimensionMismatch",
            AttackError::InvalidPermutation { .. } => "InvalidPermutation",
            AttackError::CorrectionFailed { .. } => "CorrectionFailed",
            AttackError::GenerationError { .. } => "GenerationError",
            AttackError::SerializationError(_) => "SerializationError",
            AttackError::IoError(_) => "IoError",
        }
    }
}

/// Convenience constructors for common error types
impl AttackError {
    pub fn format_error(file: &str, expected: &str, actual: &str, error_code: u32) -> Self {
        AttackError::FormatError {
            file: file.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            error_code,
        }
    }

    pub fn invalid_parameter(parameter: &str, expected: &str, actual: &str) -> Self {
        AttackError::InvalidParameter {
            parameter: parameter.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            error_code: error_codes::INVALID_CODE_PARAMETERS,
        }
    }

    pub fn dimension_mismatch(operation: &str, expected: &str, actual: &str) -> Self {
        AttackError::DimensionMismatch {
            operation: operation.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            error_code: error_codes::SHAPE_MISMATCH,
        }
    }

    pub fn invalid_permutation(cause: &str, error_code: u32) -> Self {
        AttackError::InvalidPermutation {
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn generation_error(cause: &str, error_code: u32) -> Self {
        AttackError::GenerationError {
            cause: cause.to_string(),
            error_code,
        }
    }

    pub fn io_error(cause: &str) -> Self {
        AttackError::IoError(cause.to_string())
    }
}

// From implementations for automatic error conversion
impl From<std::io::Error> for AttackError {
    fn from(err: std::io::Error) -> Self {
        AttackError::io_error(&format!("IO operation failed: {}", err))
    }
}

impl From<serde_json::Error> for AttackError {
    fn from(err: serde_json::Error) -> Self {
        AttackError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for AttackError {
    fn from(err: bincode::Error) -> Self {
        AttackError::SerializationError(err.to_string())
    }
}

/// Result type alias for recovery operations
pub type AttackResult<T> = Result<T, AttackError>;
