//! AES Core Implementation
//!
//! This module provides the core functionality of the AES (Advanced
//! Encryption Standard) algorithm: key expansion and single-block
//! encryption/decryption. It includes implementations for both encryption
//! and decryption processes along with the necessary auxiliary functions.
//!
//! The implementation follows a software-based approach, primarily utilizing
//! a lookup table for the S-Box substitution and the [`crate::gf`] module for
//! the GF(2^8) arithmetic underlying MixColumns and the key schedule's round
//! constants. It does not include modes of operation like CBC; see
//! [`crate::aes::cbc`] and [`crate::aes::key`] for that.
//!
//! # Notes
//!
//! - The round keys are stored and managed as a flat byte buffer rather than
//!   a multi-dimensional array, matching the organization used elsewhere in
//!   this crate's AES modules.
//! - State is the standard AES column-major 4x4 byte matrix: byte index
//!   `r + 4*c` is row `r`, column `c`.

use crate::gf;
use crate::Error;

/// AES block size in bytes. Fixed by the standard.
pub const AES_BLOCK_SIZE: usize = 16;

/// Key size in bytes for AES-128.
pub const AES_128_KEY_SIZE: usize = 16;
/// Key size in bytes for AES-192.
pub const AES_192_KEY_SIZE: usize = 24;
/// Key size in bytes for AES-256.
pub const AES_256_KEY_SIZE: usize = 32;

const NB: usize = 4;

/// The forward S-Box used in the SubBytes step.
const S_BOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

/// The inverse S-Box used in the InvSubBytes step.
const INV_S_BOX: [u8; 256] = [
    0x52, 0x09, 0x6a, 0xd5, 0x30, 0x36, 0xa5, 0x38, 0xbf, 0x40, 0xa3, 0x9e, 0x81, 0xf3, 0xd7, 0xfb,
    0x7c, 0xe3, 0x39, 0x82, 0x9b, 0x2f, 0xff, 0x87, 0x34, 0x8e, 0x43, 0x44, 0xc4, 0xde, 0xe9, 0xcb,
    0x54, 0x7b, 0x94, 0x32, 0xa6, 0xc2, 0x23, 0x3d, 0xee, 0x4c, 0x95, 0x0b, 0x42, 0xfa, 0xc3, 0x4e,
    0x08, 0x2e, 0xa1, 0x66, 0x28, 0xd9, 0x24, 0xb2, 0x76, 0x5b, 0xa2, 0x49, 0x6d, 0x8b, 0xd1, 0x25,
    0x72, 0xf8, 0xf6, 0x64, 0x86, 0x68, 0x98, 0x16, 0xd4, 0xa4, 0x5c, 0xcc, 0x5d, 0x65, 0xb6, 0x92,
    0x6c, 0x70, 0x48, 0x50, 0xfd, 0xed, 0xb9, 0xda, 0x5e, 0x15, 0x46, 0x57, 0xa7, 0x8d, 0x9d, 0x84,
    0x90, 0xd8, 0xab, 0x00, 0x8c, 0xbc, 0xd3, 0x0a, 0xf7, 0xe4, 0x58, 0x05, 0xb8, 0xb3, 0x45, 0x06,
    0xd0, 0x2c, 0x1e, 0x8f, 0xca, 0x3f, 0x0f, 0x02, 0xc1, 0xaf, 0xbd, 0x03, 0x01, 0x13, 0x8a, 0x6b,
    0x3a, 0x91, 0x11, 0x41, 0x4f, 0x67, 0xdc, 0xea, 0x97, 0xf2, 0xcf, 0xce, 0xf0, 0xb4, 0xe6, 0x73,
    0x96, 0xac, 0x74, 0x22, 0xe7, 0xad, 0x35, 0x85, 0xe2, 0xf9, 0x37, 0xe8, 0x1c, 0x75, 0xdf, 0x6e,
    0x47, 0xf1, 0x1a, 0x71, 0x1d, 0x29, 0xc5, 0x89, 0x6f, 0xb7, 0x62, 0x0e, 0xaa, 0x18, 0xbe, 0x1b,
    0xfc, 0x56, 0x3e, 0x4b, 0xc6, 0xd2, 0x79, 0x20, 0x9a, 0xdb, 0xc0, 0xfe, 0x78, 0xcd, 0x5a, 0xf4,
    0x1f, 0xdd, 0xa8, 0x33, 0x88, 0x07, 0xc7, 0x31, 0xb1, 0x12, 0x10, 0x59, 0x27, 0x80, 0xec, 0x5f,
    0x60, 0x51, 0x7f, 0xa9, 0x19, 0xb5, 0x4a, 0x0d, 0x2d, 0xe5, 0x7a, 0x9f, 0x93, 0xc9, 0x9c, 0xef,
    0xa0, 0xe0, 0x3b, 0x4d, 0xae, 0x2a, 0xf5, 0xb0, 0xc8, 0xeb, 0xbb, 0x3c, 0x83, 0x53, 0x99, 0x61,
    0x17, 0x2b, 0x04, 0x7e, 0xba, 0x77, 0xd6, 0x26, 0xe1, 0x69, 0x14, 0x63, 0x55, 0x21, 0x0c, 0x7d,
];

/// The forward MixColumns matrix.
const MIX_COLUMNS: [u8; 16] = [2, 3, 1, 1, 1, 2, 3, 1, 1, 1, 2, 3, 3, 1, 1, 2];
/// The inverse MixColumns matrix.
const INV_MIX_COLUMNS: [u8; 16] = [14, 11, 13, 9, 9, 14, 11, 13, 13, 9, 14, 11, 11, 13, 9, 14];

/// Validate a key length and return (words-in-key, rounds).
fn calculate_parameters(key_len: usize) -> Result<(usize, usize), Error> {
    match key_len {
        AES_128_KEY_SIZE => Ok((4, 10)),
        AES_192_KEY_SIZE => Ok((6, 12)),
        AES_256_KEY_SIZE => Ok((8, 14)),
        _ => Err(Error::InvalidLength {
            expected: "16, 24, or 32 bytes".into(),
            actual: key_len,
        }),
    }
}

/// Expand an AES key into a buffer of `(rounds + 1)` 16-byte round keys.
///
/// Follows the Rijndael key schedule: the first `nk` words come straight
/// from the master key; thereafter every `nk`-th word is rotated, S-boxed,
/// and XORed with a round constant that itself advances by GF(2^8)
/// multiplication by 2 each time it's consumed (starting at 1), and — for
/// AES-256 only — every fourth word in between is S-boxed without rotation.
fn expand_key(key: &[u8], nk: usize, rounds: usize) -> Vec<u8> {
    let total_words = NB * (rounds + 1);
    let mut expanded = vec![0u8; total_words * 4];
    expanded[..key.len()].copy_from_slice(key);

    let mut rc: u8 = 1;
    let mut i = nk;
    while i < total_words {
        let mut temp = [
            expanded[(i - 1) * 4],
            expanded[(i - 1) * 4 + 1],
            expanded[(i - 1) * 4 + 2],
            expanded[(i - 1) * 4 + 3],
        ];

        if i % nk == 0 {
            temp.rotate_left(1);
            for b in temp.iter_mut() {
                *b = S_BOX[*b as usize];
            }
            temp[0] ^= rc;
            rc = gf::multiply(rc, 2);
        } else if nk > 6 && i % nk == 4 {
            for b in temp.iter_mut() {
                *b = S_BOX[*b as usize];
            }
        }

        for j in 0..4 {
            expanded[i * 4 + j] = expanded[(i - nk) * 4 + j] ^ temp[j];
        }
        i += 1;
    }

    expanded
}

fn round_key(expanded: &[u8], round: usize) -> &[u8] {
    &expanded[round * 16..round * 16 + 16]
}

fn add_round_key(state: &mut [u8; 16], key: &[u8]) {
    for i in 0..16 {
        state[i] ^= key[i];
    }
}

fn sub_bytes(state: &mut [u8; 16]) {
    for b in state.iter_mut() {
        *b = S_BOX[*b as usize];
    }
}

fn inv_sub_bytes(state: &mut [u8; 16]) {
    for b in state.iter_mut() {
        *b = INV_S_BOX[*b as usize];
    }
}

/// Row `r`, column `c` lives at index `r + 4*c`.
fn shift_rows(state: &mut [u8; 16]) {
    for row in 1..4 {
        let mut vals = [0u8; 4];
        for col in 0..4 {
            vals[col] = state[row + 4 * ((col + row) % 4)];
        }
        for col in 0..4 {
            state[row + 4 * col] = vals[col];
        }
    }
}

fn inv_shift_rows(state: &mut [u8; 16]) {
    for row in 1..4 {
        let mut vals = [0u8; 4];
        for col in 0..4 {
            vals[col] = state[row + 4 * ((col + 4 - row) % 4)];
        }
        for col in 0..4 {
            state[row + 4 * col] = vals[col];
        }
    }
}

fn mix_columns(state: &mut [u8; 16]) {
    for col in 0..4 {
        let column = &state[col * 4..col * 4 + 4];
        let mixed = gf::transform(column, &MIX_COLUMNS);
        state[col * 4..col * 4 + 4].copy_from_slice(&mixed);
    }
}

fn inv_mix_columns(state: &mut [u8; 16]) {
    for col in 0..4 {
        let column = &state[col * 4..col * 4 + 4];
        let mixed = gf::transform(column, &INV_MIX_COLUMNS);
        state[col * 4..col * 4 + 4].copy_from_slice(&mixed);
    }
}

/// Encrypt a single 16-byte block in place using AES.
///
/// # Parameters
///
/// * `block`: The 16-byte plaintext block, encrypted in place.
/// * `key`: The AES key; its length (16, 24, or 32 bytes) selects
///   AES-128/192/256.
///
/// # Errors
///
/// Returns [`Error::InvalidLength`] if `key` is not 16, 24, or 32 bytes.
pub fn encrypt_block(block: &mut [u8; AES_BLOCK_SIZE], key: &[u8]) -> Result<(), Error> {
    let (nk, rounds) = calculate_parameters(key.len())?;
    let expanded = expand_key(key, nk, rounds);

    add_round_key(block, round_key(&expanded, 0));
    for round in 1..rounds {
        sub_bytes(block);
        shift_rows(block);
        mix_columns(block);
        add_round_key(block, round_key(&expanded, round));
    }
    sub_bytes(block);
    shift_rows(block);
    add_round_key(block, round_key(&expanded, rounds));

    Ok(())
}

/// Decrypt a single 16-byte block in place using AES.
///
/// # Parameters
///
/// * `block`: The 16-byte ciphertext block, decrypted in place.
/// * `key`: The AES key; its length (16, 24, or 32 bytes) selects
///   AES-128/192/256.
///
/// # Errors
///
/// Returns [`Error::InvalidLength`] if `key` is not 16, 24, or 32 bytes.
pub fn decrypt_block(block: &mut [u8; AES_BLOCK_SIZE], key: &[u8]) -> Result<(), Error> {
    let (nk, rounds) = calculate_parameters(key.len())?;
    let expanded = expand_key(key, nk, rounds);

    add_round_key(block, round_key(&expanded, rounds));
    inv_shift_rows(block);
    inv_sub_bytes(block);
    for round in (1..rounds).rev() {
        add_round_key(block, round_key(&expanded, round));
        inv_mix_columns(block);
        inv_shift_rows(block);
        inv_sub_bytes(block);
    }
    add_round_key(block, round_key(&expanded, 0));

    Ok(())
}

/// Return the round count implied by a key length: 10/12/14 for
/// AES-128/192/256.
///
/// # Errors
///
/// Returns [`Error::InvalidLength`] if `key_len` is not 16, 24, or 32.
pub fn rounds_for_key_len(key_len: usize) -> Result<usize, Error> {
    calculate_parameters(key_len).map(|(_, rounds)| rounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test vectors sourced from https://www.cryptool.org/en/cto/aes-step-by-step.
    #[test]
    fn aes_128_known_answer() {
        let mut block: [u8; 16] = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00,
        ];
        let key: [u8; 16] = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
            0xee, 0xff,
        ];
        let expected: [u8; 16] = [
            0xfd, 0xe4, 0xfb, 0xae, 0x4a, 0x09, 0xe0, 0x20, 0xef, 0xf7, 0x22, 0x96, 0x9f, 0x83,
            0x83, 0x2b,
        ];

        encrypt_block(&mut block, &key).unwrap();
        assert_eq!(block, expected);

        decrypt_block(&mut block, &key).unwrap();
        assert_eq!(
            block,
            [0u8; 16],
            "decrypting the known ciphertext must recover the all-zero plaintext"
        );
    }

    #[test]
    fn fips_197_appendix_b_vector() {
        let mut block: [u8; 16] = [
            0x32, 0x43, 0xf6, 0xa8, 0x88, 0x5a, 0x30, 0x8d, 0x31, 0x31, 0x98, 0xa2, 0xe0, 0x37,
            0x07, 0x34,
        ];
        let key: [u8; 16] = [
            0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf,
            0x4f, 0x3c,
        ];
        let expected: [u8; 16] = [
            0x39, 0x25, 0x84, 0x1d, 0x02, 0xdc, 0x09, 0xfb, 0xdc, 0x11, 0x85, 0x97, 0x19, 0x6a,
            0x0b, 0x32,
        ];

        encrypt_block(&mut block, &key).unwrap();
        assert_eq!(block, expected);
    }

    #[test]
    fn round_trip_all_key_sizes() {
        for key_len in [AES_128_KEY_SIZE, AES_192_KEY_SIZE, AES_256_KEY_SIZE] {
            let key: Vec<u8> = (0..key_len).map(|i| i as u8).collect();
            let original: [u8; 16] = [
                0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd,
                0xee, 0xff, 0x00,
            ];
            let mut block = original;
            encrypt_block(&mut block, &key).unwrap();
            assert_ne!(block, original);
            decrypt_block(&mut block, &key).unwrap();
            assert_eq!(block, original);
        }
    }

    #[test]
    fn invalid_key_length_is_rejected() {
        let mut block = [0u8; 16];
        let bad_key = [0u8; 20];
        assert!(matches!(
            encrypt_block(&mut block, &bad_key),
            Err(Error::InvalidLength { .. })
        ));
    }
}
