//! Error types for sealing and opening envelopes.

use thiserror::Error;

/// Result type alias for scryptbox operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The OS random generator could not produce a salt or nonce.
    #[error("OS random generator unavailable")]
    Entropy,

    /// scrypt rejected its parameters or output length.
    #[error("key derivation failed: {0}")]
    Derivation(String),

    /// Header cannot be parsed, or the sealed block is missing or truncated.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Returned for a wrong passphrase and for corrupted data alike.
    #[error("invalid password or corrupted data")]
    Authentication,

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedEnvelope(msg.into())
    }
}
