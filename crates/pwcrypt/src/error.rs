//! Error types for token encryption and decryption.
//!
//! Every failure is returned as a value. Callers branch on [`CipherError::kind`]
//! to decide what to show a user; the core never renders messages itself.

use thiserror::Error;

use crate::algorithm::Algorithm;

/// Reasons a token string fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The token does not split into exactly four `|`-delimited fields.
    #[error("expected 4 fields, found {0}")]
    FieldCount(usize),

    /// The iterations field is not a positive integer.
    #[error("iterations field is not a positive integer")]
    Iterations,

    /// The algorithm field is not an integer naming a known algorithm.
    #[error("algorithm field is not a known algorithm id")]
    AlgorithmId,

    /// The salt or payload field is not valid base64.
    #[error("{field} field is not valid base64")]
    Base64 {
        /// `"salt"` or `"payload"`.
        field: &'static str,
    },

    /// The decoded salt has the wrong length.
    #[error("salt must be {expected} bytes, got {actual}")]
    SaltLength { expected: usize, actual: usize },
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// Empty plaintext or token, or a zero work factor.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// The token string is malformed.
    #[error("invalid token format: {0}")]
    Format(#[from] FormatError),

    /// The payload is shorter than the fixed-size prefix of its algorithm.
    #[error("{algorithm} payload too short: {len} bytes, need at least {min}")]
    Truncated {
        algorithm: Algorithm,
        len: usize,
        min: usize,
    },

    /// Tag or MAC verification failed: tampered payload or wrong master key.
    #[error("{0} authentication failed")]
    Authentication(Algorithm),

    /// An algorithm id outside the known set.
    #[error("unsupported algorithm id: {0}")]
    UnsupportedAlgorithm(u8),

    /// The key does not satisfy the algorithm's length constraint.
    #[error("invalid key length for {algorithm}: {len} bytes")]
    InvalidKeyLength { algorithm: Algorithm, len: usize },

    /// The primitive refused to encrypt the input.
    #[error("{0} encryption failed")]
    Encryption(Algorithm),

    /// The authenticated plaintext is not valid UTF-8.
    #[error("decrypted plaintext is not valid UTF-8")]
    InvalidUtf8,

    /// The key derivation backend rejected its parameters.
    #[error("key derivation failed: {0}")]
    Kdf(String),
}

/// Coarse failure category exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Format,
    Authentication,
    UnsupportedAlgorithm,
    Internal,
}

impl CipherError {
    /// Returns the failure category for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CipherError::InvalidInput(_) => ErrorKind::InvalidInput,
            CipherError::Format(_) | CipherError::Truncated { .. } => ErrorKind::Format,
            CipherError::Authentication(_) => ErrorKind::Authentication,
            CipherError::UnsupportedAlgorithm(_) => ErrorKind::UnsupportedAlgorithm,
            CipherError::InvalidKeyLength { .. }
            | CipherError::Encryption(_)
            | CipherError::InvalidUtf8
            | CipherError::Kdf(_) => ErrorKind::Internal,
        }
    }
}
