//! Reversible, multi-algorithm protection for short secrets.
//!
//! [`SecretCipher::encrypt`](TokenCipher::encrypt) derives a per-message key
//! from a [`MasterKey`] with PBKDF2-HMAC-SHA256 (random salt, random work
//! factor), seals the plaintext with a randomly chosen [`Algorithm`], and
//! returns a self-describing token:
//!
//! ```text
//! <iterations>|<algorithm id>|<base64(salt)>|<base64(payload)>
//! ```
//!
//! [`TokenCipher::decrypt`] needs nothing but the master key and the token.
//! This crate has no async or I/O dependencies; callers on an async runtime
//! should run it on a blocking pool.

pub mod algorithm;
pub mod cipher;
pub mod error;
pub mod kdf;
pub mod key;
pub mod token;

pub use algorithm::Algorithm;
pub use cipher::{SecretCipher, TokenCipher};
pub use error::{CipherError, ErrorKind, FormatError};
pub use key::{MasterKey, MASTER_KEY_LEN};
pub use token::Token;
