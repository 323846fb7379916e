//! AES-GCM and ChaCha20-Poly1305 payloads.
//!
//! Both share one layout, `nonce(12) || tag(16) || ciphertext`, with no
//! associated data. The tag is stored ahead of the ciphertext, so the
//! primitives are driven through their detached in-place API.

use aes::Aes192;
use aes_gcm::{
    aead::{
        consts::{U12, U16},
        generic_array::GenericArray,
        AeadCore, AeadInPlace, KeyInit,
    },
    Aes128Gcm, Aes256Gcm, AesGcm,
};
use chacha20poly1305::ChaCha20Poly1305;
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use super::{ensure_min_len, Algorithm};
use crate::error::CipherError;

/// Byte length of the AEAD nonce (96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the AEAD authentication tag (128 bits).
pub const TAG_LEN: usize = 16;

/// Byte length of a ChaCha20-Poly1305 key.
pub const CHACHA_KEY_LEN: usize = 32;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Encrypt with AES-GCM. The key size selects AES-128, AES-192 or AES-256.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] unless `key` is 16, 24 or 32 bytes.
pub fn seal_aes_gcm(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError> {
    let alg = Algorithm::AesGcm;
    match key.len() {
        16 => seal_detached(&build::<Aes128Gcm>(alg, key)?, alg, plaintext),
        24 => seal_detached(&build::<Aes192Gcm>(alg, key)?, alg, plaintext),
        32 => seal_detached(&build::<Aes256Gcm>(alg, key)?, alg, plaintext),
        len => Err(CipherError::InvalidKeyLength { algorithm: alg, len }),
    }
}

/// Decrypt an AES-GCM payload.
///
/// # Errors
///
/// Returns [`CipherError::Truncated`] for payloads under 28 bytes and
/// [`CipherError::Authentication`] on tag mismatch.
pub fn open_aes_gcm(payload: &[u8], key: &[u8]) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    let alg = Algorithm::AesGcm;
    ensure_min_len(alg, payload)?;
    match key.len() {
        16 => open_detached(&build::<Aes128Gcm>(alg, key)?, alg, payload),
        24 => open_detached(&build::<Aes192Gcm>(alg, key)?, alg, payload),
        32 => open_detached(&build::<Aes256Gcm>(alg, key)?, alg, payload),
        len => Err(CipherError::InvalidKeyLength { algorithm: alg, len }),
    }
}

/// Encrypt with ChaCha20-Poly1305.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] unless `key` is exactly 32 bytes.
pub fn seal_chacha20_poly1305(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError> {
    let alg = Algorithm::ChaCha20Poly1305;
    check_chacha_key(key)?;
    seal_detached(&build::<ChaCha20Poly1305>(alg, key)?, alg, plaintext)
}

/// Decrypt a ChaCha20-Poly1305 payload.
///
/// # Errors
///
/// Returns [`CipherError::Truncated`] for payloads under 28 bytes and
/// [`CipherError::Authentication`] on tag mismatch.
pub fn open_chacha20_poly1305(
    payload: &[u8],
    key: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    let alg = Algorithm::ChaCha20Poly1305;
    ensure_min_len(alg, payload)?;
    check_chacha_key(key)?;
    open_detached(&build::<ChaCha20Poly1305>(alg, key)?, alg, payload)
}

fn check_chacha_key(key: &[u8]) -> Result<(), CipherError> {
    if key.len() != CHACHA_KEY_LEN {
        return Err(CipherError::InvalidKeyLength {
            algorithm: Algorithm::ChaCha20Poly1305,
            len: key.len(),
        });
    }
    Ok(())
}

fn build<A: KeyInit>(alg: Algorithm, key: &[u8]) -> Result<A, CipherError> {
    A::new_from_slice(key).map_err(|_| CipherError::InvalidKeyLength {
        algorithm: alg,
        len: key.len(),
    })
}

fn seal_detached<A>(cipher: &A, alg: Algorithm, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>
where
    A: AeadInPlace + AeadCore<NonceSize = U12, TagSize = U16>,
{
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let mut ciphertext = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(&nonce), b"", &mut ciphertext)
        .map_err(|_| CipherError::Encryption(alg))?;

    let mut payload = Vec::with_capacity(NONCE_LEN + TAG_LEN + ciphertext.len());
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(tag.as_slice());
    payload.extend_from_slice(&ciphertext);
    Ok(payload)
}

fn open_detached<A>(
    cipher: &A,
    alg: Algorithm,
    payload: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CipherError>
where
    A: AeadInPlace + AeadCore<NonceSize = U12, TagSize = U16>,
{
    let (nonce, rest) = payload.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);

    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(nonce),
            b"",
            buffer.as_mut_slice(),
            GenericArray::from_slice(tag),
        )
        .map_err(|_| CipherError::Authentication(alg))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_key(len: usize) -> Vec<u8> {
        let mut key = vec![0u8; len];
        OsRng.fill_bytes(&mut key);
        key
    }

    #[test]
    fn aes_gcm_round_trip_all_key_sizes() {
        for len in [16, 24, 32] {
            let key = random_key(len);
            let payload = seal_aes_gcm(b"123-45-6789", &key).unwrap();
            assert_eq!(payload.len(), NONCE_LEN + TAG_LEN + 11);
            let plain = open_aes_gcm(&payload, &key).unwrap();
            assert_eq!(plain.as_slice(), b"123-45-6789");
        }
    }

    #[test]
    fn aes_gcm_rejects_bad_key_length() {
        for len in [0, 15, 20, 33] {
            assert!(matches!(
                seal_aes_gcm(b"x", &random_key(len)),
                Err(CipherError::InvalidKeyLength { len: l, .. }) if l == len
            ));
        }
    }

    #[test]
    fn chacha_round_trip() {
        let key = random_key(32);
        let payload = seal_chacha20_poly1305(b"secret", &key).unwrap();
        let plain = open_chacha20_poly1305(&payload, &key).unwrap();
        assert_eq!(plain.as_slice(), b"secret");
    }

    #[test]
    fn chacha_requires_32_byte_key() {
        assert!(seal_chacha20_poly1305(b"x", &random_key(16)).is_err());
        assert!(seal_chacha20_poly1305(b"x", &random_key(24)).is_err());
    }

    #[test]
    fn empty_plaintext_is_a_bare_prefix() {
        let key = random_key(32);
        let payload = seal_chacha20_poly1305(b"", &key).unwrap();
        assert_eq!(payload.len(), NONCE_LEN + TAG_LEN);
        assert!(open_chacha20_poly1305(&payload, &key).unwrap().is_empty());
    }

    #[test]
    fn fresh_nonce_per_call() {
        let key = random_key(32);
        let a = seal_aes_gcm(b"same", &key).unwrap();
        let b = seal_aes_gcm(b"same", &key).unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let payload = seal_aes_gcm(b"secret", &random_key(32)).unwrap();
        assert!(matches!(
            open_aes_gcm(&payload, &random_key(32)),
            Err(CipherError::Authentication(Algorithm::AesGcm))
        ));
    }

    type SealFn = fn(&[u8], &[u8]) -> Result<Vec<u8>, CipherError>;
    type OpenFn = fn(&[u8], &[u8]) -> Result<Zeroizing<Vec<u8>>, CipherError>;

    #[test]
    fn every_tampered_byte_is_detected() {
        let key = random_key(32);
        let cases: [(SealFn, OpenFn); 2] = [
            (seal_aes_gcm, open_aes_gcm),
            (seal_chacha20_poly1305, open_chacha20_poly1305),
        ];
        for (seal, open) in cases {
            let payload = seal(b"tamper me", &key).unwrap();
            for i in 0..payload.len() {
                let mut tampered = payload.clone();
                tampered[i] ^= 0x01;
                assert!(
                    matches!(open(&tampered, &key), Err(CipherError::Authentication(_))),
                    "flip at byte {i} went undetected"
                );
            }
        }
    }

    #[test]
    fn tag_precedes_ciphertext() {
        // Moving the tag to the end (the primitives' native layout) must not verify.
        let key = random_key(32);
        let payload = seal_aes_gcm(b"layout check", &key).unwrap();
        let mut native = payload[..NONCE_LEN].to_vec();
        native.extend_from_slice(&payload[NONCE_LEN + TAG_LEN..]);
        native.extend_from_slice(&payload[NONCE_LEN..NONCE_LEN + TAG_LEN]);
        assert!(open_aes_gcm(&native, &key).is_err());
    }
}
