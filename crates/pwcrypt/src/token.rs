//! Token wire format.
//!
//! ```text
//! <iterations>|<algorithm id>|<base64(salt)>|<base64(payload)>
//! ```
//!
//! Standard padded base64. Neither integers nor base64 contain `|`, so no
//! escaping is needed and the string is safe in a text column or JSON.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::algorithm::Algorithm;
use crate::error::FormatError;
use crate::kdf::SALT_LEN;

/// Field separator.
pub const DELIMITER: char = '|';

const FIELD_COUNT: usize = 4;

/// A parsed token: everything needed to re-derive the key and open the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// PBKDF2 work factor.
    pub iterations: u32,
    pub algorithm: Algorithm,
    pub salt: [u8; SALT_LEN],
    /// Algorithm-specific payload bytes.
    pub payload: Vec<u8>,
}

impl Token {
    /// Parse a token string.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] naming the first field that fails to parse.
    pub fn parse(s: &str) -> Result<Self, FormatError> {
        let fields: Vec<&str> = s.split(DELIMITER).collect();
        if fields.len() != FIELD_COUNT {
            return Err(FormatError::FieldCount(fields.len()));
        }

        let iterations = fields[0]
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or(FormatError::Iterations)?;

        let algorithm = fields[1]
            .parse::<u8>()
            .ok()
            .and_then(|id| Algorithm::try_from(id).ok())
            .ok_or(FormatError::AlgorithmId)?;

        let salt_bytes = STANDARD
            .decode(fields[2])
            .map_err(|_| FormatError::Base64 { field: "salt" })?;
        let salt: [u8; SALT_LEN] =
            salt_bytes
                .as_slice()
                .try_into()
                .map_err(|_| FormatError::SaltLength {
                    expected: SALT_LEN,
                    actual: salt_bytes.len(),
                })?;

        let payload = STANDARD
            .decode(fields[3])
            .map_err(|_| FormatError::Base64 { field: "payload" })?;

        Ok(Self {
            iterations,
            algorithm,
            salt,
            payload,
        })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}{DELIMITER}{}",
            self.iterations,
            self.algorithm.id(),
            STANDARD.encode(self.salt),
            STANDARD.encode(&self.payload),
        )
    }
}

impl FromStr for Token {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
