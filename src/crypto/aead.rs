use super::{KEY_LEN, NONCE_LEN};
use crate::error::{Error, Result};
use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use getrandom::fill;
use zeroize::Zeroizing;

/// Fill buffer with cryptographically secure random bytes
pub(crate) fn secure_random(buf: &mut [u8]) -> Result<()> {
    fill(buf).map_err(|_| Error::Entropy)
}

/// Generate a fresh salt of `len` bytes
pub fn generate_salt(len: usize) -> Result<Vec<u8>> {
    let mut salt = vec![0u8; len];
    secure_random(&mut salt)?;
    Ok(salt)
}

/// The box nonce is the first `NONCE_LEN` bytes of the salt.
///
/// A salt therefore seals exactly one payload; never reuse one.
pub fn nonce_from_salt(salt: &[u8]) -> Result<[u8; NONCE_LEN]> {
    salt.get(..NONCE_LEN)
        .and_then(|n| n.try_into().ok())
        .ok_or_else(|| {
            Error::InvalidOptions(format!(
                "salt must be at least {NONCE_LEN} bytes, got {}",
                salt.len()
            ))
        })
}

fn cipher(key: &[u8]) -> Result<XChaCha20Poly1305> {
    if key.len() != KEY_LEN {
        return Err(Error::InvalidOptions(format!(
            "key must be {KEY_LEN} bytes, got {}",
            key.len()
        )));
    }
    Ok(XChaCha20Poly1305::new(Key::from_slice(key)))
}

/// Encrypt plaintext; the tag is appended to the returned bytes
pub fn seal(key: &[u8], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    cipher(key)?
        .encrypt(XNonce::from_slice(nonce), plaintext)
        .map_err(|_| Error::InvalidOptions("payload too large to seal".into()))
}

/// Decrypt and authenticate a sealed block
pub fn open(key: &[u8], nonce: &[u8; NONCE_LEN], sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let plaintext = cipher(key)?
        .decrypt(XNonce::from_slice(nonce), sealed)
        .map_err(|_| Error::Authentication)?;
    Ok(Zeroizing::new(plaintext))
}
