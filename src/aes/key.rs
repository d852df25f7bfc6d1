//! AES key object: couples a master key and a running IV, and applies
//! PKCS#7-style padding around CBC encryption.
//!
//! The reference implementation this crate's wire format must stay
//! compatible with swaps between several concrete `Key` implementations
//! behind one interface (for testing). This crate expresses that as the
//! [`AesKey`] trait, with [`Key`] as the one production implementation.

use rand::RngCore;

use super::cbc::{cbc_decrypt, cbc_encrypt};
use super::core::AES_BLOCK_SIZE;
use crate::padding::{pkcs7_pad, pkcs7_unpad};
use crate::Error;

/// Something that behaves like an AES-CBC key object: it can encrypt and
/// decrypt whole messages (padding and chaining handled internally), it can
/// be serialized/deserialized to the wire format, and it can be cloned into
/// an independent copy that starts from the same (key, IV) but evolves on
/// its own from then on.
///
/// [`Session`](crate::net::session::Session) is generic over this trait
/// rather than hard-wired to [`Key`], so the IV-synchronization invariant
/// between `send_key` and `recv_key` can be tested against a stub that
/// records calls instead of performing real AES.
pub trait AesKey {
    /// Pad, CBC-encrypt, and advance the IV.
    fn encrypt(&mut self, message: &[u8]) -> Result<Vec<u8>, Error>;

    /// CBC-decrypt, strip padding, and advance the IV.
    fn decrypt(&mut self, cipher: &[u8]) -> Result<Vec<u8>, Error>;

    /// Serialize to the wire format: `len(key):1 || key || iv`.
    fn serialize(&self) -> Vec<u8>;

    /// An independent copy starting from the same (key, IV).
    fn copy(&self) -> Self
    where
        Self: Sized;
}

/// An AES key plus its currently-running CBC initialization vector.
///
/// The IV mutates on every `encrypt`/`decrypt` call, to the last ciphertext
/// block produced or consumed by that call. This is what lets two
/// independently-owned `Key`s, started from the same (key, IV), stay in
/// lock-step as long as they see the same sequence of operations — the
/// property [`Session`](crate::net::session::Session) depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    key: Vec<u8>,
    iv: [u8; AES_BLOCK_SIZE],
}

impl Key {
    /// Build a key object from an explicit key and IV.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] if `key` is not 16, 24, or 32 bytes,
    /// or `iv` is not 16 bytes.
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, Error> {
        if !matches!(key.len(), 16 | 24 | 32) {
            return Err(Error::InvalidLength {
                expected: "16, 24, or 32 bytes".into(),
                actual: key.len(),
            });
        }
        if iv.len() != AES_BLOCK_SIZE {
            return Err(Error::InvalidLength {
                expected: "16 bytes".into(),
                actual: iv.len(),
            });
        }

        let mut iv_arr = [0u8; AES_BLOCK_SIZE];
        iv_arr.copy_from_slice(iv);
        Ok(Key {
            key: key.to_vec(),
            iv: iv_arr,
        })
    }

    /// Generate a random key and IV. `bits` must be 128, 192, or 256.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] if `bits` is not one of 128/192/256.
    pub fn generate(bits: usize) -> Result<Self, Error> {
        let key_len = match bits {
            128 => 16,
            192 => 24,
            256 => 32,
            _ => {
                return Err(Error::InvalidLength {
                    expected: "128, 192, or 256 bits".into(),
                    actual: bits,
                })
            }
        };

        let mut key = vec![0u8; key_len];
        let mut iv = [0u8; AES_BLOCK_SIZE];
        let mut rng = rand::thread_rng();
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut iv);

        Ok(Key { key, iv })
    }

    /// Deserialize from the wire format `len(key):1 || key || iv`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] if `data` is too short for the
    /// declared key length, or the key/IV lengths are invalid.
    pub fn deserialize(data: &[u8]) -> Result<Self, Error> {
        let key_len = *data.first().ok_or(Error::InvalidLength {
            expected: "at least 1 byte".into(),
            actual: data.len(),
        })? as usize;

        let key_end = 1 + key_len;
        let iv_end = key_end + AES_BLOCK_SIZE;
        if data.len() < iv_end {
            return Err(Error::InvalidLength {
                expected: format!("{} bytes", iv_end),
                actual: data.len(),
            });
        }

        Key::new(&data[1..key_end], &data[key_end..iv_end])
    }

    /// The current IV (the last ciphertext block seen, or the original IV
    /// if no operation has run yet).
    pub fn iv(&self) -> &[u8; AES_BLOCK_SIZE] {
        &self.iv
    }
}

impl AesKey for Key {
    fn encrypt(&mut self, message: &[u8]) -> Result<Vec<u8>, Error> {
        let mut padded = message.to_vec();
        pkcs7_pad(&mut padded, AES_BLOCK_SIZE)?;

        let (ciphertext, new_iv) = cbc_encrypt(&padded, &self.iv, &self.key)?;
        self.iv = new_iv;
        Ok(ciphertext)
    }

    fn decrypt(&mut self, cipher: &[u8]) -> Result<Vec<u8>, Error> {
        let (mut padded, new_iv) = cbc_decrypt(cipher, &self.iv, &self.key)?;
        self.iv = new_iv;

        pkcs7_unpad(&mut padded)?;
        Ok(padded)
    }

    fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.key.len() + AES_BLOCK_SIZE);
        out.push(self.key.len() as u8);
        out.extend_from_slice(&self.key);
        out.extend_from_slice(&self.iv);
        out
    }

    fn copy(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_pads_to_one_block() {
        let mut key = Key::new(&[0u8; 16], &[0u8; 16]).unwrap();
        let ciphertext = key.encrypt(&[]).unwrap();
        assert_eq!(ciphertext.len(), 16);
    }

    #[test]
    fn round_trips_with_fresh_copies() {
        let base = Key::new(b"0123456789abcdef", &[7u8; 16]).unwrap();
        let mut enc = base.copy();
        let mut dec = base.copy();

        let message = b"the quick brown fox jumps over the lazy dog";
        let ciphertext = enc.encrypt(message).unwrap();
        let plaintext = dec.decrypt(&ciphertext).unwrap();

        assert_eq!(plaintext, message.to_vec());
    }

    #[test]
    fn iv_advances_to_last_ciphertext_block() {
        let mut key = Key::new(&[0u8; 16], &[0u8; 16]).unwrap();
        let ciphertext = key.encrypt(b"hello world").unwrap();
        assert_eq!(&ciphertext[ciphertext.len() - 16..], key.iv());
    }

    #[test]
    fn serialize_round_trips() {
        let key = Key::new(b"0123456789abcdef", &[9u8; 16]).unwrap();
        let bytes = key.serialize();
        let restored = Key::deserialize(&bytes).unwrap();
        assert_eq!(key, restored);
    }

    #[test]
    fn generate_produces_correct_lengths() {
        for (bits, key_len) in [(128, 16), (192, 24), (256, 32)] {
            let key = Key::generate(bits).unwrap();
            assert_eq!(key.key.len(), key_len);
        }
    }
}
