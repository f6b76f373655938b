//! Envelope format v1.
//!
//! V1 layout (integers little-endian):
//! ```text
//! MAGIC (4) | VERSION (1) | LOG_N (1) | R (4) | P (4) | SALT_LEN (2) | SALT | SEALED
//! ```
//!
//! `SEALED` runs to the end of the data and holds at least the tag.

use super::{Envelope, MAGIC, MAGIC_LEN, VER_LEN};
use crate::KdfParams;
use crate::crypto::{NONCE_LEN, TAG_LEN};
use crate::error::{Error, Result};

pub const VERSION_V1: u8 = 1;

const LOG_N_LEN: usize = 1;
const R_LEN: usize = 4;
const P_LEN: usize = 4;
const SALT_LEN_LEN: usize = 2;

/// Fixed part of the header, up to and including the salt length.
pub const FIXED_LEN: usize = MAGIC_LEN + VER_LEN + LOG_N_LEN + R_LEN + P_LEN + SALT_LEN_LEN;

/// Largest salt the length field can describe.
pub const MAX_SALT_LEN: usize = u16::MAX as usize;

pub fn parse(data: &[u8]) -> Result<Envelope> {
    if data.len() < FIXED_LEN {
        return Err(Error::malformed("header truncated"));
    }

    let mut offset = MAGIC_LEN + VER_LEN;

    let log_n = data[offset];
    offset += LOG_N_LEN;

    let r = u32::from_le_bytes(le_field(data, offset)?);
    offset += R_LEN;

    let p = u32::from_le_bytes(le_field(data, offset)?);
    offset += P_LEN;

    let salt_len = u16::from_le_bytes(le_field(data, offset)?) as usize;
    offset += SALT_LEN_LEN;

    if salt_len < NONCE_LEN {
        return Err(Error::malformed(format!(
            "salt of {salt_len} bytes is shorter than the {NONCE_LEN} byte nonce"
        )));
    }

    let salt = data
        .get(offset..offset + salt_len)
        .ok_or_else(|| Error::malformed("salt truncated"))?
        .to_vec();
    offset += salt_len;

    let sealed = &data[offset..];
    if sealed.len() < TAG_LEN {
        return Err(Error::malformed("sealed block missing or truncated"));
    }

    let kdf = KdfParams::new(log_n, r, p)
        .map_err(|e| Error::malformed(format!("bad key parameters: {e}")))?;

    Ok(Envelope::new(kdf, salt, sealed.to_vec()))
}

fn le_field<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| Error::malformed("header truncated"))
}

pub fn serialize(envelope: &Envelope) -> Result<Vec<u8>> {
    if envelope.version() != VERSION_V1 {
        return Err(Error::malformed("wrong version for v1 serializer"));
    }

    let salt = envelope.salt();
    if salt.len() < NONCE_LEN || salt.len() > MAX_SALT_LEN {
        return Err(Error::InvalidOptions(format!(
            "salt length must be in {NONCE_LEN}..={MAX_SALT_LEN}, got {}",
            salt.len()
        )));
    }

    let kdf = envelope.kdf();
    let mut buf = Vec::with_capacity(FIXED_LEN + salt.len() + envelope.sealed().len());

    buf.extend_from_slice(MAGIC);
    buf.push(VERSION_V1);

    buf.push(kdf.log_n());
    buf.extend_from_slice(&kdf.r().to_le_bytes());
    buf.extend_from_slice(&kdf.p().to_le_bytes());

    buf.extend_from_slice(&(salt.len() as u16).to_le_bytes());
    buf.extend_from_slice(salt);
    buf.extend_from_slice(envelope.sealed());

    Ok(buf)
}
