//! Integrity digest over a rendered filter
//!
//! The stored digest is `SHA256(SHA256(rendered))`. The double hash is part
//! of the wire format: verifiers recompute exactly this value.

use std::fmt;

use sha2::{Digest, Sha256};

use super::config::DIGEST_LEN;
use crate::error::TagError;

/// Raw 32-byte tamper-evidence digest
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegrityDigest([u8; DIGEST_LEN]);

impl IntegrityDigest {
    /// Digest the canonical bit-string of a filter
    pub fn compute(rendered: &[u8]) -> Self {
        let inner = Sha256::digest(rendered);
        let outer = Sha256::digest(inner);

        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&outer);
        Self(bytes)
    }

    /// Single SHA-256 of the rendered filter (the inner hash)
    pub fn inner(rendered: &[u8]) -> [u8; DIGEST_LEN] {
        let mut bytes = [0u8; DIGEST_LEN];
        bytes.copy_from_slice(&Sha256::digest(rendered));
        bytes
    }

    /// Wrap digest bytes read back from a payload
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TagError> {
        let digest: [u8; DIGEST_LEN] = bytes.try_into().map_err(|_| TagError::TruncatedPayload {
            actual: bytes.len(),
            required: DIGEST_LEN,
        })?;
        Ok(Self(digest))
    }

    /// Raw digest bytes as embedded in the payload
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex form for logs and error messages
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for IntegrityDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for IntegrityDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntegrityDigest({})", self.to_hex())
    }
}

impl AsRef<[u8]> for IntegrityDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
