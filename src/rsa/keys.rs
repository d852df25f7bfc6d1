//! RSA key generation, raw encrypt/decrypt, and wire serialization.

use num_bigint::{BigInt, BigUint, ToBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::error::Error;
use crate::rsa::primality::generate_prime;

/// Number of Fermat-test rounds run against each generated prime candidate.
const PRIMALITY_ROUNDS: u32 = 40;

/// The fixed public exponent search start, per common RSA practice.
const DEFAULT_E: u64 = 65537;

/// Minimum modulus size this crate will generate or accept.
pub const MIN_KEY_BITS: u32 = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub n: BigUint,
    pub e: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKey {
    pub n: BigUint,
    pub d: BigUint,
}

/// Generate an RSA key pair with a modulus of `bits` bits.
///
/// `bits` must be at least [`MIN_KEY_BITS`]; smaller moduli are rejected
/// before any primes are drawn since the cost of generation scales with the
/// bit length and a tiny modulus can't hold a session key anyway.
pub fn generate_keypair(bits: u32) -> Result<(PrivateKey, PublicKey), Error> {
    if bits < MIN_KEY_BITS {
        return Err(Error::InvalidLength {
            expected: format!(">= {MIN_KEY_BITS} bits"),
            actual: bits as usize,
        });
    }

    let half = bits / 2;
    let (p, q) = loop {
        let p = generate_prime(half, PRIMALITY_ROUNDS);
        let q = generate_prime(bits - half, PRIMALITY_ROUNDS);
        if p != q {
            break (p, q);
        }
    };

    let n = &p * &q;
    let one = BigUint::one();
    let phi = (&p - &one) * (&q - &one);

    let mut e = BigUint::from(DEFAULT_E);
    while phi.gcd(&e) != one {
        e += BigUint::from(2u8);
    }

    let d = mod_inverse(&e, &phi).expect("gcd(e, phi) == 1 by construction above");

    Ok((PrivateKey { n: n.clone(), d }, PublicKey { n, e }))
}

/// Compute the modular multiplicative inverse of `a` mod `m` via the
/// extended Euclidean algorithm. Returns `None` if `a` and `m` aren't
/// coprime.
fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    let (mut old_r, mut r) = (a.to_bigint(), m.to_bigint());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let quotient = &old_r / &r;
        let new_r = &old_r - &quotient * &r;
        old_r = r;
        r = new_r;

        let new_s = &old_s - &quotient * &s;
        old_s = s;
        s = new_s;
    }

    if old_r != BigInt::one() {
        return None;
    }

    let m_signed = m.to_bigint();
    let result = ((old_s % &m_signed) + &m_signed) % &m_signed;
    Some(result.to_biguint().expect("non-negative by construction"))
}

trait ToBigIntExt {
    fn to_bigint(&self) -> BigInt;
}

impl ToBigIntExt for BigUint {
    fn to_bigint(&self) -> BigInt {
        ToBigInt::to_bigint(self).expect("BigUint always converts to BigInt")
    }
}

impl PublicKey {
    /// Encrypt `message` as a single unpadded block: `c = m^e mod n`.
    ///
    /// `message` is interpreted as a big-endian integer. Returns
    /// [`Error::MessageTooLarge`] if that integer is not strictly smaller
    /// than the modulus.
    pub fn encrypt(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
        let m = BigUint::from_bytes_be(message);
        if m >= self.n {
            return Err(Error::MessageTooLarge);
        }
        let c = m.modpow(&self.e, &self.n);
        Ok(c.to_bytes_be())
    }

    /// Serialize as `be(e, 4 bytes) || be(n)`: `e` is packed into exactly 4
    /// big-endian bytes (it stays at or near 65537, so it always fits),
    /// followed by `n`'s big-endian encoding with no length prefix.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + (self.n.bits() as usize + 7) / 8);
        let e_bytes = self.e.to_bytes_be();
        out.extend_from_slice(&[0u8; 4][..4 - e_bytes.len()]);
        out.extend_from_slice(&e_bytes);
        out.extend_from_slice(&self.n.to_bytes_be());
        out
    }

    /// Parse the format produced by [`PublicKey::serialize`].
    pub fn deserialize(data: &[u8]) -> Result<Self, Error> {
        if data.len() < 4 {
            return Err(Error::InvalidLength {
                expected: ">= 4 bytes".to_string(),
                actual: data.len(),
            });
        }
        let e = BigUint::from_bytes_be(&data[0..4]);
        let n = BigUint::from_bytes_be(&data[4..]);
        Ok(PublicKey { n, e })
    }
}

impl PrivateKey {
    /// Decrypt a single unpadded block produced by [`PublicKey::encrypt`]:
    /// `m = c^d mod n`.
    pub fn decrypt(&self, cipher: &[u8]) -> Vec<u8> {
        let c = BigUint::from_bytes_be(cipher);
        let m = c.modpow(&self.d, &self.n);
        m.to_bytes_be()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_key_sizes_below_minimum() {
        let result = generate_keypair(256);
        assert!(matches!(result, Err(Error::InvalidLength { .. })));
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let (private, public) = generate_keypair(512).unwrap();
        let message = b"a short session payload";
        let cipher = public.encrypt(message).unwrap();
        let recovered = private.decrypt(&cipher);
        // decrypt returns the minimal big-endian encoding; leading zero
        // bytes from the original message would be lost, so compare against
        // a message with no leading zero byte.
        assert_eq!(recovered, message);
    }

    #[test]
    fn message_at_or_above_modulus_is_rejected() {
        let (_, public) = generate_keypair(512).unwrap();
        let too_big = public.n.to_bytes_be();
        assert!(matches!(public.encrypt(&too_big), Err(Error::MessageTooLarge)));
    }

    #[test]
    fn public_key_serialization_round_trips() {
        let (_, public) = generate_keypair(512).unwrap();
        let bytes = public.serialize();
        let parsed = PublicKey::deserialize(&bytes).unwrap();
        assert_eq!(parsed, public);
    }

    #[test]
    fn serialization_packs_e_into_exactly_four_bytes() {
        let (_, public) = generate_keypair(512).unwrap();
        let bytes = public.serialize();

        // be(e, 4 bytes) with no length prefix: e's big-endian encoding,
        // left-padded with zeros to exactly 4 bytes.
        let e_bytes = public.e.to_bytes_be();
        let mut expected_e_field = vec![0u8; 4 - e_bytes.len()];
        expected_e_field.extend_from_slice(&e_bytes);
        assert_eq!(&bytes[0..4], expected_e_field.as_slice());
        assert_eq!(&bytes[4..], public.n.to_bytes_be().as_slice());
    }
}
