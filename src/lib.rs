//! Passphrase-sealed boxes.
//!
//! A [`Sealer`] derives a key from a passphrase with scrypt, choosing the
//! strongest cost that fits a time budget, and seals a payload with
//! XChaCha20-Poly1305. The result is a self-describing envelope: a
//! versioned header carrying the salt and scrypt parameters, followed by the
//! sealed block. [`open`] reverses it with a single derivation at the cost
//! recorded in the header.
//!
//! Payloads are buffered in memory on both sides; this is meant for small
//! secrets, not bulk data.

pub mod crypto;
mod error;
pub mod format;
pub mod storage;
pub mod token;

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use zeroize::Zeroizing;

pub use crate::crypto::{Calibrator, KdfParams, KeyParams};
pub use crate::error::{Error, Result};
use crate::crypto::{KEY_LEN, NONCE_LEN};
use crate::format::Envelope;
use crate::format::v1::MAX_SALT_LEN;

/// Default calibration budget in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
/// Default calibration budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(DEFAULT_TIMEOUT_MS);
/// Default salt length; the first 24 bytes double as the box nonce.
pub const DEFAULT_SALT_LEN: usize = 32;

/// How envelopes are sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealOptions {
    salt_len: usize,
    key_len: usize,
    timeout: Duration,
}

impl Default for SealOptions {
    fn default() -> Self {
        Self {
            salt_len: DEFAULT_SALT_LEN,
            key_len: KEY_LEN,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SealOptions {
    pub fn new(salt_len: usize, key_len: usize, timeout: Duration) -> Result<Self> {
        let options = Self {
            salt_len,
            key_len,
            timeout,
        };
        options.validate()?;
        Ok(options)
    }

    /// Default options with a different calibration budget.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    pub fn salt_len(&self) -> usize {
        self.salt_len
    }

    pub fn key_len(&self) -> usize {
        self.key_len
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn validate(&self) -> Result<()> {
        if self.salt_len < NONCE_LEN || self.salt_len > MAX_SALT_LEN {
            return Err(Error::InvalidOptions(format!(
                "salt length must be in {NONCE_LEN}..={MAX_SALT_LEN}, got {}",
                self.salt_len
            )));
        }
        if self.key_len != KEY_LEN {
            return Err(Error::InvalidOptions(format!(
                "key length must be {KEY_LEN}, got {}",
                self.key_len
            )));
        }
        Ok(())
    }
}

/// Seals payloads into envelopes.
///
/// Every seal draws a fresh salt, and the salt also supplies the box nonce,
/// so no derived key ever seals two payloads.
#[derive(Debug, Clone, Default)]
pub struct Sealer {
    calibrator: Arc<Calibrator>,
    options: SealOptions,
}

impl Sealer {
    /// A sealer with its own, empty calibration table.
    pub fn new(options: SealOptions) -> Self {
        Self::with_calibrator(Arc::new(Calibrator::new()), options)
    }

    /// A sealer reusing timing observations from `calibrator`.
    pub fn with_calibrator(calibrator: Arc<Calibrator>, options: SealOptions) -> Self {
        Self {
            calibrator,
            options,
        }
    }

    pub fn options(&self) -> &SealOptions {
        &self.options
    }

    pub fn calibrator(&self) -> &Arc<Calibrator> {
        &self.calibrator
    }

    /// Seal everything read from `plaintext` and write the envelope to `out`.
    ///
    /// Nothing is written unless sealing succeeded. A failed write may leave
    /// a partial envelope behind; treat it as invalid.
    pub fn seal<R: Read, W: Write>(
        &self,
        passphrase: &[u8],
        mut plaintext: R,
        mut out: W,
    ) -> Result<KdfParams> {
        let (envelope, kdf) = self.seal_reader(passphrase, &mut plaintext)?;
        out.write_all(&envelope)?;
        out.flush()?;
        Ok(kdf)
    }

    /// Seal an in-memory payload.
    pub fn seal_to_vec(&self, passphrase: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let (envelope, _) = self.seal_reader(passphrase, plaintext)?;
        Ok(envelope)
    }

    /// Seal an in-memory payload straight into a file, replacing it atomically.
    pub fn seal_file(&self, passphrase: &[u8], plaintext: &[u8], path: &Path) -> Result<KdfParams> {
        let (envelope, kdf) = self.seal_reader(passphrase, plaintext)?;
        storage::write_atomic(path, &envelope)?;
        Ok(kdf)
    }

    fn seal_reader<R: Read>(
        &self,
        passphrase: &[u8],
        mut plaintext: R,
    ) -> Result<(Vec<u8>, KdfParams)> {
        self.options.validate()?;

        let params = self.calibrator.calibrate(
            passphrase,
            self.options.salt_len,
            self.options.key_len,
            self.options.timeout,
        )?;
        let nonce = crypto::nonce_from_salt(params.salt())?;

        let mut buf = Zeroizing::new(Vec::new());
        plaintext.read_to_end(&mut buf)?;

        let sealed = crypto::seal(params.key(), &nonce, &buf)?;
        let envelope = Envelope::new(params.kdf(), params.salt().to_vec(), sealed);
        let bytes = format::serialize(&envelope)?;

        debug!(
            "sealed {} bytes into a {} byte envelope (log_n={})",
            buf.len(),
            bytes.len(),
            params.log_n()
        );
        Ok((bytes, params.kdf()))
    }
}

/// Open an envelope read from `envelope`.
///
/// Returns the recovered parameters (with the derived key populated) and the
/// plaintext. On any failure no plaintext is returned.
pub fn open<R: Read>(
    passphrase: &[u8],
    mut envelope: R,
) -> Result<(KeyParams, Zeroizing<Vec<u8>>)> {
    let mut data = Vec::new();
    envelope.read_to_end(&mut data)?;
    open_slice(passphrase, &data)
}

/// Open an in-memory envelope.
pub fn open_slice(passphrase: &[u8], data: &[u8]) -> Result<(KeyParams, Zeroizing<Vec<u8>>)> {
    let envelope = format::parse(data)?;

    let mut params = KeyParams::new(envelope.salt().to_vec(), envelope.kdf());
    params.populate(passphrase, KEY_LEN)?;

    let nonce = crypto::nonce_from_salt(params.salt())?;
    let plaintext = crypto::open(params.key(), &nonce, envelope.sealed())?;

    debug!(
        "opened {} byte envelope (log_n={})",
        data.len(),
        params.log_n()
    );
    Ok((params, plaintext))
}

/// Open an envelope file.
pub fn open_file(passphrase: &[u8], path: &Path) -> Result<(KeyParams, Zeroizing<Vec<u8>>)> {
    let data = storage::read(path)?;
    open_slice(passphrase, &data)
}

/// Read the public header of an envelope without a passphrase.
///
/// The returned parameters carry no key.
pub fn inspect(data: &[u8]) -> Result<KeyParams> {
    let envelope = format::parse(data)?;
    Ok(KeyParams::new(envelope.salt().to_vec(), envelope.kdf()))
}
