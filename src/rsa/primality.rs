//! Fermat probable-primality testing and random prime generation.

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::RngCore;

/// Run `iterations` rounds of the Fermat primality test against `n`.
///
/// For each round, draw `a` uniformly from `[2, n-2]` and reject `n` as
/// composite if `a^(n-1) mod n != 1`. Small values are handled directly:
/// `n <= 1` is composite, `n <= 3` is prime.
///
/// This is a probabilistic test — like all Fermat-style tests it can be
/// fooled by Carmichael numbers, but at RSA key-generation bit lengths with
/// enough iterations this is adequate and matches the reference
/// implementation's approach.
pub fn is_probable_prime(n: &BigUint, iterations: u32) -> bool {
    let one = BigUint::one();
    let two = &one + &one;
    let three = &two + &one;

    if n <= &one {
        return false;
    }
    if n <= &three {
        return true;
    }
    if n.is_even_internal() {
        return false;
    }

    let n_minus_one = n - &one;

    let mut rng = rand::thread_rng();
    for _ in 0..iterations {
        // gen_biguint_range's upper bound is exclusive, so passing
        // n_minus_one here samples uniformly from [2, n-2], as required.
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        if a.modpow(&n_minus_one, n) != one {
            return false;
        }
    }

    true
}

trait IsEvenInternal {
    fn is_even_internal(&self) -> bool;
}

impl IsEvenInternal for BigUint {
    fn is_even_internal(&self) -> bool {
        self % 2u8 == BigUint::zero()
    }
}

/// Generate a probable prime of exactly `bits` bits.
///
/// Draws `bits` random bits, forces the top bit (to guarantee the requested
/// bit length) and the bottom bit (to guarantee oddness), then repeats the
/// Fermat test until a probable prime is found.
pub fn generate_prime(bits: u32, iterations: u32) -> BigUint {
    let byte_len = ((bits + 7) / 8) as usize;
    let mut rng = rand::thread_rng();

    loop {
        let mut bytes = vec![0u8; byte_len];
        rng.fill_bytes(&mut bytes);

        // BigUint::from_bytes_be is big-endian; the most significant byte
        // is bytes[0]. Force bit (bits - 1) and bit 0.
        let top_bit_in_byte = (bits - 1) % 8;
        bytes[0] |= 1 << top_bit_in_byte;
        // Clear any stray bits above the requested length in the top byte.
        if top_bit_in_byte < 7 {
            bytes[0] &= (1 << (top_bit_in_byte + 1)) - 1;
            bytes[0] |= 1 << top_bit_in_byte;
        }
        let last = bytes.len() - 1;
        bytes[last] |= 1;

        let candidate = BigUint::from_bytes_be(&bytes);
        if is_probable_prime(&candidate, iterations) {
            return candidate;
        }
    }
}
