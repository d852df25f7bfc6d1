//! Byte-array padding schemes used to align block-cipher input to a fixed
//! block size.

mod pkcs7;

pub use pkcs7::{pkcs7_pad, pkcs7_unpad};
