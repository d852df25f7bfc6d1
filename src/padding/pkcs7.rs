//! PKCS#7-style padding and unpadding.
//!
//! Defined in RFC 2315 section 10.3. A padding byte whose *value* equals the
//! *count* of padding bytes is appended until the data reaches a multiple of
//! the block size; if the data was already block-aligned, a full block of
//! padding is added so that unpadding is always unambiguous.

use crate::Error;

/// Apply PKCS#7 padding to `data` in place, to a multiple of `block_size`.
///
/// # Errors
///
/// Returns [`Error::InvalidLength`] if `block_size` is 0 or >= 256 (the
/// padding byte must fit in a single byte).
pub fn pkcs7_pad(data: &mut Vec<u8>, block_size: usize) -> Result<(), Error> {
    if block_size == 0 || block_size >= 256 {
        return Err(Error::InvalidLength {
            expected: "a block size between 1 and 255".into(),
            actual: block_size,
        });
    }

    let padding_size = block_size - (data.len() % block_size);
    data.extend(std::iter::repeat(padding_size as u8).take(padding_size));
    Ok(())
}

/// Remove PKCS#7 padding from `data` in place.
///
/// # Errors
///
/// Returns [`Error::InvalidLength`] if `data` is empty, or the trailing
/// padding bytes are not internally consistent.
pub fn pkcs7_unpad(data: &mut Vec<u8>) -> Result<(), Error> {
    let padding_byte = *data.last().ok_or(Error::InvalidLength {
        expected: "non-empty data".into(),
        actual: 0,
    })? as usize;

    if padding_byte == 0 || padding_byte > data.len() {
        return Err(Error::InvalidLength {
            expected: "a padding length between 1 and data.len()".into(),
            actual: padding_byte,
        });
    }

    if data.iter().rev().take(padding_byte).any(|&b| b as usize != padding_byte) {
        return Err(Error::InvalidLength {
            expected: "consistent padding bytes".into(),
            actual: padding_byte,
        });
    }

    data.truncate(data.len() - padding_byte);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_block_size() {
        let mut data = vec![0x01, 0x02, 0x03];
        pkcs7_pad(&mut data, 8).unwrap();
        assert_eq!(data, vec![0x01, 0x02, 0x03, 0x05, 0x05, 0x05, 0x05, 0x05]);
    }

    #[test]
    fn aligned_data_gets_a_full_block() {
        let mut data = vec![0u8; 16];
        pkcs7_pad(&mut data, 16).unwrap();
        assert_eq!(data.len(), 32);
        assert!(data[16..].iter().all(|&b| b == 16));
    }

    #[test]
    fn pad_then_unpad_round_trips() {
        let original = vec![0x01, 0x02, 0x03];
        let mut data = original.clone();
        pkcs7_pad(&mut data, 8).unwrap();
        pkcs7_unpad(&mut data).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn rejects_inconsistent_padding() {
        let mut data = vec![0x01, 0x02, 0x03, 0x05, 0x05, 0x05, 0x05, 0x04];
        assert!(pkcs7_unpad(&mut data).is_err());
    }

    #[test]
    fn rejects_invalid_block_size() {
        let mut data = vec![0x01];
        assert!(pkcs7_pad(&mut data, 0).is_err());
        assert!(pkcs7_pad(&mut data, 256).is_err());
    }
}
