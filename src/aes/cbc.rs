//! AES Encryption and Decryption in CBC Mode
//!
//! This module provides the raw Cipher Block Chaining primitives on top of
//! [`crate::aes::core`]: no padding is applied here, and the caller is
//! responsible for supplying a message whose length is already a multiple of
//! [`AES_BLOCK_SIZE`]. Padding and IV bookkeeping live one layer up, in
//! [`crate::aes::key`].
//!
//! CBC chains blocks together by XORing each plaintext block with the
//! previous ciphertext block (or the IV, for the first block) before
//! encrypting, which is what makes identical plaintext blocks encrypt to
//! different ciphertext.

use super::core::{decrypt_block, encrypt_block, AES_BLOCK_SIZE};
use crate::Error;

fn xor_block(a: &mut [u8; AES_BLOCK_SIZE], b: &[u8]) {
    for i in 0..AES_BLOCK_SIZE {
        a[i] ^= b[i];
    }
}

/// Encrypt `message` using AES-CBC.
///
/// # Parameters
///
/// * `message`: Plaintext; its length must be a multiple of `AES_BLOCK_SIZE`.
/// * `iv`: The 16-byte initialization vector to chain from.
/// * `key`: The AES key (16, 24, or 32 bytes).
///
/// # Returns
///
/// `(ciphertext, final_chain)`, where `final_chain` is the last ciphertext
/// block produced — the value the caller should carry forward as the next
/// IV.
///
/// # Errors
///
/// Returns [`Error::InvalidLength`] if `message` is not a multiple of 16
/// bytes, or if `iv` is not 16 bytes.
pub fn cbc_encrypt(
    message: &[u8],
    iv: &[u8],
    key: &[u8],
) -> Result<(Vec<u8>, [u8; AES_BLOCK_SIZE]), Error> {
    if iv.len() != AES_BLOCK_SIZE {
        return Err(Error::InvalidLength {
            expected: "16 bytes".into(),
            actual: iv.len(),
        });
    }
    if message.len() % AES_BLOCK_SIZE != 0 {
        return Err(Error::InvalidLength {
            expected: "a multiple of 16 bytes".into(),
            actual: message.len(),
        });
    }

    let mut chain = [0u8; AES_BLOCK_SIZE];
    chain.copy_from_slice(iv);

    let mut ciphertext = Vec::with_capacity(message.len());
    for block in message.chunks(AES_BLOCK_SIZE) {
        xor_block(&mut chain, block);
        encrypt_block(&mut chain, key)?;
        ciphertext.extend_from_slice(&chain);
    }

    Ok((ciphertext, chain))
}

/// Decrypt `ciphertext` using AES-CBC.
///
/// # Parameters
///
/// * `ciphertext`: The encrypted data; its length must be a multiple of
///   `AES_BLOCK_SIZE`.
/// * `iv`: The 16-byte initialization vector used for encryption.
/// * `key`: The AES key (16, 24, or 32 bytes).
///
/// # Returns
///
/// `(plaintext, final_chain)`, where `final_chain` is the last ciphertext
/// block consumed — the value the caller should carry forward as the next
/// IV.
///
/// # Errors
///
/// Returns [`Error::InvalidLength`] if `ciphertext` is not a multiple of 16
/// bytes, or if `iv` is not 16 bytes.
pub fn cbc_decrypt(
    ciphertext: &[u8],
    iv: &[u8],
    key: &[u8],
) -> Result<(Vec<u8>, [u8; AES_BLOCK_SIZE]), Error> {
    if iv.len() != AES_BLOCK_SIZE {
        return Err(Error::InvalidLength {
            expected: "16 bytes".into(),
            actual: iv.len(),
        });
    }
    if ciphertext.len() % AES_BLOCK_SIZE != 0 {
        return Err(Error::InvalidLength {
            expected: "a multiple of 16 bytes".into(),
            actual: ciphertext.len(),
        });
    }

    let mut vector = [0u8; AES_BLOCK_SIZE];
    vector.copy_from_slice(iv);

    let mut plaintext = Vec::with_capacity(ciphertext.len());
    for block in ciphertext.chunks(AES_BLOCK_SIZE) {
        let mut working = [0u8; AES_BLOCK_SIZE];
        working.copy_from_slice(block);
        decrypt_block(&mut working, key)?;
        xor_block(&mut working, &vector);
        plaintext.extend_from_slice(&working);
        vector.copy_from_slice(block);
    }

    Ok((plaintext, vector))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let key = [0x2bu8; 16];
        let iv = [0x00u8; 16];
        let message = [0x11u8; 48];

        let (ciphertext, final_iv_enc) = cbc_encrypt(&message, &iv, &key).unwrap();
        let (plaintext, final_iv_dec) = cbc_decrypt(&ciphertext, &iv, &key).unwrap();

        assert_eq!(plaintext, message.to_vec());
        assert_eq!(final_iv_enc, final_iv_dec);
    }

    #[test]
    fn final_chain_is_last_ciphertext_block() {
        let key = [0x00u8; 16];
        let iv = [0x00u8; 16];
        let message = [0xABu8; 32];

        let (ciphertext, chain) = cbc_encrypt(&message, &iv, &key).unwrap();
        assert_eq!(&ciphertext[16..32], &chain);
    }

    #[test]
    fn rejects_unaligned_message() {
        let key = [0x00u8; 16];
        let iv = [0x00u8; 16];
        assert!(matches!(
            cbc_encrypt(&[0u8; 5], &iv, &key),
            Err(Error::InvalidLength { .. })
        ));
    }

    #[test]
    fn rejects_short_iv() {
        let key = [0x00u8; 16];
        assert!(matches!(
            cbc_encrypt(&[0u8; 16], &[0u8; 8], &key),
            Err(Error::InvalidLength { .. })
        ));
    }
}
