//! Envelope framing.
//!
//! Provides version-aware parsing and serialization of sealed envelopes.

use crate::KdfParams;
use crate::error::{Error, Result};

pub mod v1;

/// Magic bytes identifying a scryptbox envelope ("SBOX").
pub const MAGIC: &[u8; 4] = b"SBOX";
/// Length of magic bytes.
pub const MAGIC_LEN: usize = 4;
/// Length of version field.
pub const VER_LEN: usize = 1;
/// Latest format version
pub const CURRENT_VERSION: u8 = v1::VERSION_V1;

/// A parsed envelope: public derivation parameters plus the sealed block.
///
/// The derived key is never part of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    version: u8,
    kdf: KdfParams,
    salt: Vec<u8>,
    sealed: Vec<u8>,
}

impl Envelope {
    pub fn new(kdf: KdfParams, salt: Vec<u8>, sealed: Vec<u8>) -> Self {
        Self {
            version: CURRENT_VERSION,
            kdf,
            salt,
            sealed,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn kdf(&self) -> KdfParams {
        self.kdf
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Ciphertext with its authentication tag.
    pub fn sealed(&self) -> &[u8] {
        &self.sealed
    }
}

/// Parses an envelope, dispatching on its version byte.
///
/// # Errors
///
/// Returns [`Error::MalformedEnvelope`] if:
/// - The data is too short
/// - The magic bytes are invalid
/// - The version is unsupported
/// - The version-specific header or sealed block is invalid
pub fn parse(data: &[u8]) -> Result<Envelope> {
    if data.len() < MAGIC_LEN + VER_LEN {
        return Err(Error::malformed("envelope too short"));
    }

    if &data[..MAGIC_LEN] != MAGIC {
        return Err(Error::malformed("invalid magic"));
    }

    match data[MAGIC_LEN] {
        v1::VERSION_V1 => v1::parse(data),
        v => Err(Error::malformed(format!("unsupported version {v}"))),
    }
}

/// Serializes an envelope to bytes.
pub fn serialize(envelope: &Envelope) -> Result<Vec<u8>> {
    match envelope.version() {
        v1::VERSION_V1 => v1::serialize(envelope),
        v => Err(Error::malformed(format!("unsupported version {v}"))),
    }
}
