//! AES-256-CBC with HMAC-SHA256, encrypt-then-MAC.
//!
//! Layout: `iv(16) || mac(32) || ciphertext`, where `mac` covers
//! `iv || ciphertext` under a MAC key expanded from the derived key
//! (see [`crate::kdf::derive_mac_key`]). The MAC is checked in constant time
//! before a single block is decrypted.

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes256Dec, Aes256Enc, Block as AesBlock};
use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::{ensure_min_len, Algorithm};
use crate::error::CipherError;
use crate::kdf::{derive_mac_key, hmac_sha256};
use crate::key::DerivedKey;

/// Byte length of the CBC initialisation vector.
pub const IV_LEN: usize = 16;

/// Byte length of the HMAC-SHA256 tag.
pub const MAC_LEN: usize = 32;

const BLOCK_LEN: usize = 16;

/// Encrypt `plaintext` with PKCS#7 padding and append the MAC.
pub fn seal(plaintext: &[u8], key: &DerivedKey) -> Result<Vec<u8>, CipherError> {
    let mac_key = derive_mac_key(key);
    let cipher = Aes256Enc::new(key.as_bytes().into());

    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = cbc_encrypt(&cipher, &iv, plaintext);
    let mac = compute_mac(&mac_key, &iv, &ciphertext);

    let mut payload = Vec::with_capacity(IV_LEN + MAC_LEN + ciphertext.len());
    payload.extend_from_slice(&iv);
    payload.extend_from_slice(&mac);
    payload.extend_from_slice(&ciphertext);
    Ok(payload)
}

/// Verify the MAC, then decrypt and strip padding.
///
/// # Errors
///
/// Returns [`CipherError::Truncated`] for payloads under 48 bytes. A MAC
/// mismatch, a ciphertext that is not a whole number of blocks, or bad padding
/// all return [`CipherError::Authentication`].
pub fn open(payload: &[u8], key: &DerivedKey) -> Result<Zeroizing<Vec<u8>>, CipherError> {
    let alg = Algorithm::AesCbcHmac;
    ensure_min_len(alg, payload)?;

    let (iv, rest) = payload.split_at(IV_LEN);
    let (mac, ciphertext) = rest.split_at(MAC_LEN);

    let mac_key = derive_mac_key(key);
    let expected = compute_mac(&mac_key, iv, ciphertext);
    if !bool::from(expected.as_slice().ct_eq(mac)) {
        return Err(CipherError::Authentication(alg));
    }

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(CipherError::Authentication(alg));
    }

    let cipher = Aes256Dec::new(key.as_bytes().into());
    let mut plaintext = cbc_decrypt(&cipher, iv, ciphertext);
    if !strip_padding(&mut plaintext) {
        return Err(CipherError::Authentication(alg));
    }
    Ok(plaintext)
}

fn compute_mac(mac_key: &DerivedKey, iv: &[u8], ciphertext: &[u8]) -> [u8; MAC_LEN] {
    hmac_sha256(mac_key.as_bytes(), &[iv, ciphertext])
}

fn cbc_encrypt(cipher: &Aes256Enc, iv: &[u8; IV_LEN], plaintext: &[u8]) -> Vec<u8> {
    // PKCS#7: always pad, a full block when already aligned.
    let pad = BLOCK_LEN - plaintext.len() % BLOCK_LEN;
    let mut padded = Zeroizing::new(Vec::with_capacity(plaintext.len() + pad));
    padded.extend_from_slice(plaintext);
    padded.resize(plaintext.len() + pad, pad as u8);

    let mut prev = *iv;
    let mut out = Vec::with_capacity(padded.len());
    for chunk in padded.chunks_exact(BLOCK_LEN) {
        let mut block = AesBlock::clone_from_slice(chunk);
        xor_in_place(block.as_mut_slice(), &prev);
        cipher.encrypt_block(&mut block);
        prev.copy_from_slice(block.as_slice());
        out.extend_from_slice(block.as_slice());
    }
    out
}

fn cbc_decrypt(cipher: &Aes256Dec, iv: &[u8], ciphertext: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut prev = [0u8; BLOCK_LEN];
    prev.copy_from_slice(iv);

    let mut out = Zeroizing::new(Vec::with_capacity(ciphertext.len()));
    for chunk in ciphertext.chunks_exact(BLOCK_LEN) {
        let mut block = AesBlock::clone_from_slice(chunk);
        cipher.decrypt_block(&mut block);
        xor_in_place(block.as_mut_slice(), &prev);
        out.extend_from_slice(block.as_slice());
        prev.copy_from_slice(chunk);
    }
    out
}

fn xor_in_place(block: &mut [u8], other: &[u8; BLOCK_LEN]) {
    for (b, o) in block.iter_mut().zip(other) {
        *b ^= o;
    }
}

/// Remove PKCS#7 padding. Returns `false` if the padding is malformed.
fn strip_padding(buf: &mut Vec<u8>) -> bool {
    let Some(&pad) = buf.last() else {
        return false;
    };
    let pad_len = pad as usize;
    if pad_len == 0 || pad_len > BLOCK_LEN || pad_len > buf.len() {
        return false;
    }
    if !buf[buf.len() - pad_len..].iter().all(|&b| b == pad) {
        return false;
    }
    buf.truncate(buf.len() - pad_len);
    true
}
