//! `cryptalk`: a from-scratch AES/RSA encrypted chat protocol.
//!
//! The crate builds upward from bare cryptographic primitives to a
//! multi-user chat server and client:
//!
//! - [`gf`] — GF(2⁸) arithmetic underlying AES's linear layer.
//! - [`aes`] — AES block cipher, CBC mode, and the [`aes::AesKey`] trait.
//! - [`padding`] — PKCS#7-style byte padding.
//! - [`sha256`] — a thin `sha2` adapter used by the session's MAC.
//! - [`rsa`] — textbook RSA key generation, encrypt, and decrypt.
//! - [`net`] — the framed connection and the authenticated session built on
//!   it.
//! - [`server`] and [`client`] — the handshake and chat protocol itself.
//!
//! Logging is emitted through the `log` facade only; embed this crate in a
//! binary that installs a subscriber (e.g. `env_logger`) to see it.

pub mod aes;
pub mod client;
mod error;
pub mod gf;
pub mod net;
pub mod padding;
pub mod rsa;
pub mod server;
pub mod sha256;

pub use client::Client;
pub use error::Error;
pub use server::Server;
