//! Shared error type for the crypto core and the protocol layers built on it.
//!
//! Every fallible operation in this crate returns `Result<T, Error>` instead
//! of the `Box<dyn std::error::Error>` used by smaller single-purpose crypto
//! libraries, because callers up at the handshake/server layer need to match
//! on *what kind* of failure occurred (reject silently? disconnect? bubble
//! up?) rather than just print a message.

use thiserror::Error as ThisError;

/// Failure modes produced by the AES/RSA/framing/session/handshake core.
#[derive(Debug, ThisError)]
pub enum Error {
    /// A block, key, IV, or chunk had the wrong length for the operation.
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        expected: String,
        actual: usize,
    },

    /// `Connection::send` or `Session::send` was called with zero bytes.
    #[error("cannot send an empty message")]
    EmptyMessage,

    /// A read or write was attempted on a connection that is already closed,
    /// or the peer closed the socket mid-read.
    #[error("connection closed")]
    ConnectionClosed,

    /// The trailing SHA-256 digest recovered from a decrypted session
    /// message did not match the hash of the message itself.
    #[error("session message failed integrity check")]
    IntegrityFailure,

    /// An RSA plaintext integer was not smaller than the modulus.
    #[error("message too large for RSA modulus")]
    MessageTooLarge,

    /// The handshake was rejected: malformed, duplicate, or reserved
    /// username.
    #[error("handshake rejected: {0}")]
    HandshakeRejected(String),

    /// A byte string that was expected to be UTF-8 was not.
    #[error("failed to decode UTF-8: {0}")]
    DecodeError(#[from] std::str::Utf8Error),

    /// Any underlying I/O failure not already classified above.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
