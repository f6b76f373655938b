//! Compact string tokens sealed under a raw 32-byte key.
//!
//! Unlike envelopes there is no passphrase or KDF involved: the caller owns
//! the key. A token is URL-safe base64 of `nonce || sealed`, with a fresh
//! random nonce per token.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use zeroize::Zeroizing;

use crate::crypto::aead::{self, secure_random};
use crate::crypto::{NONCE_LEN, TAG_LEN};
use crate::error::{Error, Result};

/// Seal `data` and encode it as a URL-safe base64 string.
pub fn encrypt_to_string(key: &[u8], data: &[u8]) -> Result<String> {
    let mut nonce = [0u8; NONCE_LEN];
    secure_random(&mut nonce)?;

    let sealed = aead::seal(key, &nonce, data)?;

    let mut raw = Vec::with_capacity(NONCE_LEN + sealed.len());
    raw.extend_from_slice(&nonce);
    raw.extend_from_slice(&sealed);
    Ok(URL_SAFE.encode(raw))
}

/// Decode and open a token produced by [`encrypt_to_string`].
pub fn decrypt_from_str(key: &[u8], token: &str) -> Result<Zeroizing<Vec<u8>>> {
    let raw = URL_SAFE
        .decode(token.trim())
        .map_err(|e| Error::malformed(format!("token is not base64: {e}")))?;

    if raw.len() < NONCE_LEN + TAG_LEN {
        return Err(Error::malformed("token too short"));
    }

    let (nonce, sealed) = raw.split_at(NONCE_LEN);
    let nonce: [u8; NONCE_LEN] = nonce
        .try_into()
        .map_err(|_| Error::malformed("token nonce truncated"))?;

    aead::open(key, &nonce, sealed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_LEN;

    const KEY: [u8; KEY_LEN] = [3u8; KEY_LEN];

    #[test]
    fn token_roundtrip() {
        let token = encrypt_to_string(&KEY, b"api-secret").unwrap();
        assert!(!token.contains('+') && !token.contains('/'));

        let data = decrypt_from_str(&KEY, &token).unwrap();
        assert_eq!(data.as_slice(), b"api-secret");
    }

    #[test]
    fn tokens_are_not_deterministic() {
        let a = encrypt_to_string(&KEY, b"same").unwrap();
        let b = encrypt_to_string(&KEY, b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let token = encrypt_to_string(&KEY, b"data").unwrap();
        assert!(matches!(
            decrypt_from_str(&[4u8; KEY_LEN], &token),
            Err(Error::Authentication)
        ));
    }

    #[test]
    fn short_key_is_rejected() {
        assert!(matches!(
            encrypt_to_string(b"too short", b"data"),
            Err(Error::InvalidOptions(_))
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            decrypt_from_str(&KEY, "not base64 !!"),
            Err(Error::MalformedEnvelope(_))
        ));
        assert!(matches!(
            decrypt_from_str(&KEY, &URL_SAFE.encode([0u8; 10])),
            Err(Error::MalformedEnvelope(_))
        ));
    }
}
