//! Encryption strategies and their payload layouts.
//!
//! ```text
//! 1  AES-GCM            nonce(12) || tag(16) || ciphertext
//! 2  ChaCha20-Poly1305  nonce(12) || tag(16) || ciphertext
//! 3  AES-CBC + HMAC     iv(16)    || mac(32) || ciphertext
//! ```
//!
//! The numeric ids are part of the token format and must never be reassigned.

pub mod aead;
pub mod cbc_hmac;

use std::fmt;

use rand::{rngs::OsRng, Rng};
use zeroize::Zeroizing;

use crate::error::CipherError;
use crate::key::DerivedKey;

/// One of the three supported strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Algorithm {
    AesGcm = 1,
    ChaCha20Poly1305 = 2,
    AesCbcHmac = 3,
}

impl Algorithm {
    /// Every algorithm, in id order.
    pub const ALL: [Algorithm; 3] = [
        Algorithm::AesGcm,
        Algorithm::ChaCha20Poly1305,
        Algorithm::AesCbcHmac,
    ];

    /// The id written into the token.
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::AesGcm => "aes-gcm",
            Algorithm::ChaCha20Poly1305 => "chacha20-poly1305",
            Algorithm::AesCbcHmac => "aes-cbc-hmac",
        }
    }

    /// Smallest payload that holds the fixed-size prefix of this layout.
    pub fn min_payload_len(self) -> usize {
        match self {
            Algorithm::AesGcm | Algorithm::ChaCha20Poly1305 => aead::NONCE_LEN + aead::TAG_LEN,
            Algorithm::AesCbcHmac => cbc_hmac::IV_LEN + cbc_hmac::MAC_LEN,
        }
    }

    /// Pick an algorithm uniformly at random using the OS CSPRNG.
    pub fn random() -> Self {
        Self::ALL[OsRng.gen_range(0..Self::ALL.len())]
    }

    /// Encrypt `plaintext` under `key`, producing this algorithm's payload.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Encryption`] if the primitive refuses the input.
    pub fn seal(self, plaintext: &[u8], key: &DerivedKey) -> Result<Vec<u8>, CipherError> {
        match self {
            Algorithm::AesGcm => aead::seal_aes_gcm(plaintext, key.as_bytes()),
            Algorithm::ChaCha20Poly1305 => aead::seal_chacha20_poly1305(plaintext, key.as_bytes()),
            Algorithm::AesCbcHmac => cbc_hmac::seal(plaintext, key),
        }
    }

    /// Authenticate and decrypt a payload produced by [`Algorithm::seal`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Truncated`] if the payload is shorter than
    /// [`Algorithm::min_payload_len`], and [`CipherError::Authentication`] if the
    /// tag or MAC does not verify. No plaintext is returned on failure.
    pub fn open(self, payload: &[u8], key: &DerivedKey) -> Result<Zeroizing<Vec<u8>>, CipherError> {
        match self {
            Algorithm::AesGcm => aead::open_aes_gcm(payload, key.as_bytes()),
            Algorithm::ChaCha20Poly1305 => aead::open_chacha20_poly1305(payload, key.as_bytes()),
            Algorithm::AesCbcHmac => cbc_hmac::open(payload, key),
        }
    }
}

impl TryFrom<u8> for Algorithm {
    type Error = CipherError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.id() == id)
            .ok_or(CipherError::UnsupportedAlgorithm(id))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reject payloads too short to slice at the algorithm's fixed offsets.
pub(crate) fn ensure_min_len(algorithm: Algorithm, payload: &[u8]) -> Result<(), CipherError> {
    let min = algorithm.min_payload_len();
    if payload.len() < min {
        return Err(CipherError::Truncated {
            algorithm,
            len: payload.len(),
            min,
        });
    }
    Ok(())
}
