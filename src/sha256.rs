//! SHA-256 adapter.
//!
//! A thin wrapper around the `sha2` crate's SHA-256 implementation, shaped
//! to match what [`crate::net::session`] needs: a one-shot digest function
//! and the fixed output size as a constant. No streaming interface is
//! exposed since nothing in this crate hashes incrementally.

use sha2::{Digest, Sha256};

/// The fixed output size of SHA-256, in bytes.
pub const HASH_SIZE: usize = 32;

/// Compute the SHA-256 digest of `data`.
pub fn hash(data: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_empty_input() {
        let digest = hash(b"");
        assert_eq!(
            hex::encode(digest),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hashes_known_answer() {
        let digest = hash(b"abc");
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(hash(b"hello world"), hash(b"hello world"));
    }
}
