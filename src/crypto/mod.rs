//! Cryptographic primitives for sealed boxes.
//!
//! Provides scrypt key derivation, cost calibration, and the AEAD box.

pub mod aead;
pub mod calibrate;
pub mod kdf;

pub use aead::{generate_salt, nonce_from_salt, open, seal};
pub use calibrate::Calibrator;
pub use kdf::{KdfParams, KeyParams, derive_key};

/// Length of the XChaCha20-Poly1305 nonce (24 bytes), taken from the salt.
pub const NONCE_LEN: usize = 24;
/// Length of the encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the Poly1305 tag appended to every sealed block.
pub const TAG_LEN: usize = 16;
/// Smallest scrypt cost exponent ever used (2^14 iterations).
pub const MIN_LOG_N: u8 = 14;
/// Calibration never probes beyond this exponent (2^22 * r * 128 bytes of memory).
pub const MAX_LOG_N: u8 = 22;
/// scrypt block size.
pub const DEFAULT_R: u32 = 8;
/// scrypt parallelism.
pub const DEFAULT_P: u32 = 1;
/// Upper bound on `r * p` accepted from a header.
pub const MAX_R_TIMES_P: u64 = DEFAULT_R as u64 * 16;
