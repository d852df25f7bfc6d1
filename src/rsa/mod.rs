//! Textbook RSA: key generation over arbitrary-precision integers, Fermat
//! probable-primality testing, and raw (unpadded) encrypt/decrypt.
//!
//! This is acceptable here only because the two things this crate ever RSA
//! -encrypts — a short username and a serialized AES key — are short,
//! high-entropy byte strings chosen once per handshake, not attacker
//! -controlled structured data. It is not suitable as a general-purpose
//! public-key encryption scheme; nothing here applies OAEP or PKCS#1
//! padding.

mod keys;
mod primality;

pub use keys::{generate_keypair, PrivateKey, PublicKey};
pub use primality::{generate_prime, is_probable_prime};
