//! Key material: the process-wide master key and per-message derived keys.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CipherError;

/// Byte length of the master key (256 bits).
pub const MASTER_KEY_LEN: usize = 32;

/// Byte length of every derived key (256 bits).
pub const KEY_LEN: usize = 32;

/// The master secret every token key is derived from.
///
/// Loaded once at startup and never mutated. The bytes are zeroed when the
/// value is dropped and never appear in `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; MASTER_KEY_LEN]);

impl MasterKey {
    pub fn from_bytes(bytes: [u8; MASTER_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a master key from a slice, which must be exactly [`MASTER_KEY_LEN`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidInput`] on any other length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CipherError> {
        let arr: [u8; MASTER_KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CipherError::InvalidInput("master key must be 32 bytes"))?;
        Ok(Self(arr))
    }

    /// Decode a standard-base64 master key, as supplied through configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidInput`] if the text is not base64 or does
    /// not decode to [`MASTER_KEY_LEN`] bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, CipherError> {
        let mut decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CipherError::InvalidInput("master key is not valid base64"))?;
        let key = Self::from_slice(&decoded);
        decoded.zeroize();
        key
    }

    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

/// A per-message symmetric key. Lives for one call, zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    pub(crate) fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}
