//! [`SecretCipher`]: the encrypt/decrypt entry points.
//!
//! Each encryption draws a fresh work factor, algorithm, salt and nonce from
//! the OS CSPRNG, so encrypting the same secret twice yields unrelated tokens.
//! Decryption needs only the master key and the token itself.

use rand::{rngs::OsRng, Rng, RngCore};
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::Zeroizing;

use crate::algorithm::Algorithm;
use crate::error::CipherError;
use crate::kdf::{derive_key, ITERATION_RANGE, SALT_LEN};
use crate::key::MasterKey;
use crate::token::Token;

/// Reversible secret protection as seen by callers.
///
/// Implementations must be safe to share across threads; every call is
/// independent.
pub trait TokenCipher: Send + Sync {
    /// Encrypt a non-empty plaintext into a self-describing token.
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;

    /// Recover the plaintext from a token produced by [`TokenCipher::encrypt`].
    fn decrypt(&self, token: &str) -> Result<String, CipherError>;

    /// Check a candidate secret against a stored token in constant time.
    ///
    /// Returns `Ok(false)` on a mismatch. Tokens that fail to decrypt are
    /// errors, not mismatches.
    fn verify(&self, candidate: &str, token: &str) -> Result<bool, CipherError> {
        let stored = Zeroizing::new(self.decrypt(token)?);
        Ok(bool::from(stored.as_bytes().ct_eq(candidate.as_bytes())))
    }
}

/// Token cipher keyed by a process-wide [`MasterKey`].
#[derive(Debug, Clone)]
pub struct SecretCipher {
    master: MasterKey,
}

impl SecretCipher {
    pub fn new(master: MasterKey) -> Self {
        Self { master }
    }

    /// Encrypt with a caller-chosen algorithm instead of a random one.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidInput`] for an empty plaintext.
    pub fn encrypt_with(&self, plaintext: &str, algorithm: Algorithm) -> Result<String, CipherError> {
        let iterations = OsRng.gen_range(ITERATION_RANGE);
        self.seal(plaintext, algorithm, iterations)
            .map(|token| token.to_string())
    }

    /// Decrypt an already-parsed token to raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Truncated`] or [`CipherError::Authentication`]
    /// from the token's strategy.
    pub fn open(&self, token: &Token) -> Result<Zeroizing<Vec<u8>>, CipherError> {
        let key = derive_key(&self.master, &token.salt, token.iterations)?;
        let plaintext = token.algorithm.open(&token.payload, &key)?;
        debug!(
            algorithm = %token.algorithm,
            iterations = token.iterations,
            "token opened"
        );
        Ok(plaintext)
    }

    fn seal(
        &self,
        plaintext: &str,
        algorithm: Algorithm,
        iterations: u32,
    ) -> Result<Token, CipherError> {
        if plaintext.is_empty() {
            return Err(CipherError::InvalidInput("plaintext must not be empty"));
        }

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let key = derive_key(&self.master, &salt, iterations)?;
        let payload = algorithm.seal(plaintext.as_bytes(), &key)?;
        debug!(algorithm = %algorithm, iterations, "token sealed");

        Ok(Token {
            iterations,
            algorithm,
            salt,
            payload,
        })
    }
}

impl TokenCipher for SecretCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        self.encrypt_with(plaintext, Algorithm::random())
    }

    fn decrypt(&self, token: &str) -> Result<String, CipherError> {
        // Fixed-width text columns pad with spaces; no field contains whitespace.
        let token = token.trim();
        if token.is_empty() {
            return Err(CipherError::InvalidInput("token must not be empty"));
        }

        let parsed = Token::parse(token)?;
        let plaintext = self.open(&parsed)?;
        std::str::from_utf8(&plaintext)
            .map(str::to_owned)
            .map_err(|_| CipherError::InvalidUtf8)
    }
}
