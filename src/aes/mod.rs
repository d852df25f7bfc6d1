//! A from-scratch AES implementation: block core, CBC mode, and the stateful
//! key object the session layer builds on.

pub mod cbc;
pub mod core;
pub mod key;

pub use cbc::{cbc_decrypt, cbc_encrypt};
pub use core::{decrypt_block, encrypt_block, AES_BLOCK_SIZE};
pub use key::{AesKey, Key};
