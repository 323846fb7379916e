//! Per-message key derivation.
//!
//! The encryption key is PBKDF2-HMAC-SHA256 over the master key, keyed by the
//! token's own salt and iteration count, so decryption can recompute it from
//! the token alone.
//!
//! The AES-CBC variant additionally needs a MAC key. It is expanded from the
//! derived key with two HMAC-SHA256 calls:
//!
//! ```text
//! prk     = HMAC(key = derived, msg = "")
//! mac_key = HMAC(key = prk,     msg = 0x01)
//! ```
//!
//! This is not RFC 5869 HKDF. Existing tokens depend on it byte-for-byte.

use std::ops::Range;

use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CipherError;
use crate::key::{DerivedKey, MasterKey, KEY_LEN};

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Byte length of the per-message salt.
pub const SALT_LEN: usize = 16;

/// Work factors chosen at encryption time. Decryption accepts any positive value.
pub const ITERATION_RANGE: Range<u32> = 10_000..50_000;

/// Derive the 32-byte per-message key.
///
/// # Errors
///
/// Returns [`CipherError::InvalidInput`] if `iterations` is zero.
pub fn derive_key(
    master: &MasterKey,
    salt: &[u8],
    iterations: u32,
) -> Result<DerivedKey, CipherError> {
    if iterations == 0 {
        return Err(CipherError::InvalidInput("iterations must be at least 1"));
    }

    let mut out = [0u8; KEY_LEN];
    pbkdf2::<HmacSha256>(master.as_bytes(), salt, iterations, &mut out)
        .map_err(|e| CipherError::Kdf(e.to_string()))?;
    Ok(DerivedKey::from_bytes(out))
}

/// Expand the MAC key for the encrypt-then-MAC strategy from a derived key.
pub fn derive_mac_key(key: &DerivedKey) -> DerivedKey {
    let prk = Zeroizing::new(hmac_sha256(key.as_bytes(), &[]));
    DerivedKey::from_bytes(hmac_sha256(prk.as_slice(), &[[0x01u8].as_slice()]))
}

/// HMAC-SHA256 of the concatenation of `parts`.
pub(crate) fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; KEY_LEN] {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC takes any key length");
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; KEY_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master() -> MasterKey {
        MasterKey::from_bytes([0x42; 32])
    }

    #[test]
    fn derivation_is_deterministic() {
        let salt = [7u8; SALT_LEN];
        let a = derive_key(&master(), &salt, 1_000).unwrap();
        let b = derive_key(&master(), &salt, 1_000).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn salt_and_iterations_change_the_key() {
        let base = derive_key(&master(), &[1u8; SALT_LEN], 1_000).unwrap();
        let other_salt = derive_key(&master(), &[2u8; SALT_LEN], 1_000).unwrap();
        let other_iter = derive_key(&master(), &[1u8; SALT_LEN], 1_001).unwrap();
        assert_ne!(base.as_bytes(), other_salt.as_bytes());
        assert_ne!(base.as_bytes(), other_iter.as_bytes());
    }

    #[test]
    fn master_key_changes_the_key() {
        let salt = [3u8; SALT_LEN];
        let a = derive_key(&master(), &salt, 1_000).unwrap();
        let b = derive_key(&MasterKey::from_bytes([0x43; 32]), &salt, 1_000).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn zero_iterations_rejected() {
        assert!(matches!(
            derive_key(&master(), &[0u8; SALT_LEN], 0),
            Err(CipherError::InvalidInput(_))
        ));
    }

    #[test]
    fn matches_pbkdf2_hmac_sha256_vector() {
        // RFC 7914 section 11: P = "passwd", S = "salt", c = 1.
        let mut out = [0u8; 64];
        pbkdf2::<HmacSha256>(b"passwd", b"salt", 1, &mut out).unwrap();
        assert_eq!(
            &out[..8],
            &[0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f]
        );
    }

    #[test]
    fn mac_key_follows_two_step_expansion() {
        let key = DerivedKey::from_bytes([9u8; KEY_LEN]);
        let expected: [u8; KEY_LEN] = [
            0xb5, 0x60, 0xdf, 0x97, 0x39, 0x5e, 0x68, 0x20, 0x6f, 0x8a, 0x23, 0x69, 0xbc, 0xfc,
            0x9d, 0xcf, 0x20, 0x53, 0xd4, 0x00, 0x3c, 0xc4, 0xbf, 0xe0, 0x6b, 0x59, 0x63, 0x90,
            0x67, 0x9f, 0x46, 0xe4,
        ];
        assert_eq!(derive_mac_key(&key).as_bytes(), &expected);
    }

    #[test]
    fn hmac_parts_are_concatenated() {
        let key = [0x0b; 20];
        assert_eq!(
            hmac_sha256(&key, &[b"Hi ".as_slice(), b"There".as_slice()]),
            hmac_sha256(&key, &[b"Hi There".as_slice()])
        );
        // RFC 4231 test case 1.
        assert_eq!(
            &hmac_sha256(&key, &[b"Hi There".as_slice()])[..8],
            &[0xb0, 0x34, 0x4c, 0x61, 0xd8, 0xdb, 0x38, 0x53]
        );
    }

    #[test]
    fn iteration_range_bounds() {
        assert_eq!(ITERATION_RANGE.start, 10_000);
        assert_eq!(ITERATION_RANGE.end, 50_000);
    }
}
