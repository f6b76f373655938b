use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use zeroize::Zeroizing;

use super::{DEFAULT_P, DEFAULT_R, MAX_LOG_N, MAX_R_TIMES_P, MIN_LOG_N};
use crate::error::{Error, Result};

/// scrypt tuning parameters stored in every envelope header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KdfParams {
    log_n: u8,
    r: u32,
    p: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            log_n: MIN_LOG_N,
            r: DEFAULT_R,
            p: DEFAULT_P,
        }
    }
}

impl KdfParams {
    pub fn new(log_n: u8, r: u32, p: u32) -> Result<Self> {
        let params = Self { log_n, r, p };
        params.validate()?;
        Ok(params)
    }

    /// Cost exponent; scrypt runs `2^log_n` iterations.
    pub fn log_n(&self) -> u8 {
        self.log_n
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p(&self) -> u32 {
        self.p
    }

    pub(crate) fn with_log_n(self, log_n: u8) -> Self {
        Self { log_n, ..self }
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_n < 1 || self.log_n > MAX_LOG_N {
            return Err(Error::Derivation(format!(
                "scrypt cost exponent must be in 1..={MAX_LOG_N}, got {}",
                self.log_n
            )));
        }
        if self.r < 1 {
            return Err(Error::Derivation("scrypt block size must be >= 1".into()));
        }
        if self.p < 1 {
            return Err(Error::Derivation("scrypt parallelism must be >= 1".into()));
        }
        // scrypt needs 128 * r * 2^log_n bytes; hold every header to the
        // footprint of the default block size at the calibration ceiling
        let blocks = u64::from(self.r) << self.log_n;
        if blocks > u64::from(DEFAULT_R) << MAX_LOG_N {
            return Err(Error::Derivation(format!(
                "scrypt memory 128 * {} * 2^{} bytes exceeds the limit",
                self.r, self.log_n
            )));
        }
        if u64::from(self.r) * u64::from(self.p) > MAX_R_TIMES_P {
            return Err(Error::Derivation(format!(
                "scrypt r * p must be <= {MAX_R_TIMES_P}, got {} * {}",
                self.r, self.p
            )));
        }
        self.to_scrypt().map(|_| ())
    }

    fn to_scrypt(self) -> Result<scrypt::Params> {
        scrypt::Params::new(self.log_n, self.r, self.p, scrypt::Params::RECOMMENDED_LEN)
            .map_err(|e| Error::Derivation(format!("invalid scrypt params: {e}")))
    }
}

/// Run scrypt once with fixed parameters.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8],
    kdf: KdfParams,
    key_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    if key_len == 0 {
        return Err(Error::Derivation("key length must be > 0".into()));
    }
    let params = kdf.to_scrypt()?;

    let mut key = Zeroizing::new(vec![0u8; key_len]);
    scrypt::scrypt(passphrase, salt, &params, key.as_mut_slice())
        .map_err(|e| Error::Derivation(format!("scrypt key derivation failed: {e}")))?;

    Ok(key)
}

/// Derivation parameters together with the key they produced.
///
/// Only the salt and [`KdfParams`] are ever persisted. The key is wiped on
/// drop and hidden from `Debug` and `Display`.
#[derive(Clone)]
pub struct KeyParams {
    salt: Vec<u8>,
    kdf: KdfParams,
    key: Zeroizing<Vec<u8>>,
}

impl KeyParams {
    /// Parameters recovered from a header, key not yet derived.
    pub fn new(salt: Vec<u8>, kdf: KdfParams) -> Self {
        Self {
            salt,
            kdf,
            key: Zeroizing::new(Vec::new()),
        }
    }

    pub(crate) fn with_key(salt: Vec<u8>, kdf: KdfParams, key: Zeroizing<Vec<u8>>) -> Self {
        Self { salt, kdf, key }
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn kdf(&self) -> KdfParams {
        self.kdf
    }

    pub fn log_n(&self) -> u8 {
        self.kdf.log_n
    }

    /// Derived key bytes; empty until [`KeyParams::populate`] ran.
    ///
    /// Avoid storing or logging this value.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Re-derive the key from the stored salt and parameters.
    pub fn populate(&mut self, passphrase: &[u8], key_len: usize) -> Result<()> {
        self.key = derive_key(passphrase, &self.salt, self.kdf, key_len)?;
        Ok(())
    }
}

impl fmt::Debug for KeyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyParams")
            .field("salt", &self.salt)
            .field("kdf", &self.kdf)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
struct PublicParams {
    salt: String,
    #[serde(flatten)]
    kdf: KdfParams,
}

impl fmt::Display for KeyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let public = PublicParams {
            salt: STANDARD.encode(&self.salt),
            kdf: self.kdf,
        };
        let json = serde_json::to_string(&public).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
