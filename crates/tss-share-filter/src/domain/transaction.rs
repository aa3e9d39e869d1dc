//! Transaction tagging
//!
//! A transaction owns an opaque payload and one membership filter. Once every
//! contributing share has been folded in, the filter is appended to the
//! payload in one of two layouts:
//!
//! ```text
//! plain:          [ application data | filter bits (M bytes) ]
//! authenticated:  [ application data | filter bits (M bytes) | SHA256(SHA256(bits)) (32 bytes) ]
//! ```
//!
//! Neither layout carries a length prefix or delimiter. Payload bytes are
//! never checked against any charset; the digest is raw binary.

use std::borrow::Cow;
use std::mem;

use tracing::warn;

use super::config::{FilterConfig, DIGEST_LEN};
use super::digest::IntegrityDigest;
use super::membership_filter::MembershipFilter;
use crate::error::TagError;

/// Which suffix layout a payload carries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagMode {
    /// Filter bits only; offers no tamper detection
    Plain,
    /// Filter bits followed by the double-SHA-256 digest
    Authenticated,
}

/// Structured view of a tagged payload
///
/// Keeps application data, filter and digest apart and only flattens them
/// in [`TaggedPayload::to_bytes`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedPayload {
    data: Vec<u8>,
    filter: MembershipFilter,
    digest: Option<IntegrityDigest>,
}

impl TaggedPayload {
    /// Payload carrying only the filter bits
    pub fn plain(data: impl Into<Vec<u8>>, filter: MembershipFilter) -> Self {
        Self {
            data: data.into(),
            filter,
            digest: None,
        }
    }

    /// Payload carrying the filter bits and their integrity digest
    pub fn authenticated(data: impl Into<Vec<u8>>, filter: MembershipFilter) -> Self {
        let digest = IntegrityDigest::compute(filter.render().as_bytes());
        Self {
            data: data.into(),
            filter,
            digest: Some(digest),
        }
    }

    /// Suffix layout
    pub fn mode(&self) -> TagMode {
        match self.digest {
            Some(_) => TagMode::Authenticated,
            None => TagMode::Plain,
        }
    }

    /// Flatten to the wire layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let rendered = self.filter.render();
        let digest_len = self.digest.map(|_| DIGEST_LEN).unwrap_or(0);

        let mut bytes = Vec::with_capacity(self.data.len() + rendered.len() + digest_len);
        bytes.extend_from_slice(&self.data);
        bytes.extend_from_slice(rendered.as_bytes());
        if let Some(digest) = &self.digest {
            bytes.extend_from_slice(digest.as_bytes());
        }
        bytes
    }

    /// Split a plain-tagged payload; the filter suffix is not authenticated
    pub fn decode_plain(bytes: &[u8], config: &FilterConfig) -> Result<Self, TagError> {
        config.validate()?;
        let filter_bytes = untag_payload(bytes, config.width)?;
        let filter = MembershipFilter::parse_bytes(filter_bytes, config)?;

        Ok(Self {
            data: bytes[..bytes.len() - config.width].to_vec(),
            filter,
            digest: None,
        })
    }

    /// Split an authenticated payload, rejecting it unless the digest matches
    pub fn decode_authenticated(bytes: &[u8], config: &FilterConfig) -> Result<Self, TagError> {
        let (data, filter, digest) = split_authenticated(bytes, config)?;

        Ok(Self {
            data: data.to_vec(),
            filter,
            digest: Some(digest),
        })
    }

    /// Application data preceding the suffix
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Embedded filter
    pub fn filter(&self) -> &MembershipFilter {
        &self.filter
    }

    /// Embedded digest, if authenticated
    pub fn digest(&self) -> Option<&IntegrityDigest> {
        self.digest.as_ref()
    }

    /// Decompose into data, filter and digest
    pub fn into_parts(self) -> (Vec<u8>, MembershipFilter, Option<IntegrityDigest>) {
        (self.data, self.filter, self.digest)
    }
}

/// A transaction's payload and the filter of its contributing shares
///
/// Once sealed the filter is frozen: further identities are not folded in
/// and the authenticated suffix cannot be appended twice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transaction {
    filter: MembershipFilter,
    payload: Vec<u8>,
    sealed: Option<TagMode>,
}

impl Transaction {
    /// Empty transaction with the default filter geometry
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty transaction with a custom filter configuration
    pub fn with_config(config: &FilterConfig) -> Result<Self, TagError> {
        Ok(Self::from_parts(MembershipFilter::with_config(config)?, Vec::new()))
    }

    /// Transaction over existing application data
    pub fn with_payload(data: impl Into<Vec<u8>>) -> Self {
        Self::from_parts(MembershipFilter::new(), data)
    }

    /// Assemble an unsealed transaction from an existing filter and payload
    pub fn from_parts(filter: MembershipFilter, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            filter,
            payload: payload.into(),
            sealed: None,
        }
    }

    /// Current filter state
    pub fn filter(&self) -> &MembershipFilter {
        &self.filter
    }

    /// Current payload bytes
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Replace the payload bytes
    pub fn set_payload(&mut self, data: impl Into<Vec<u8>>) {
        self.payload = data.into();
    }

    /// Layout of the last seal, if any
    pub fn sealed_mode(&self) -> Option<TagMode> {
        self.sealed
    }

    /// True once `tag` or `tag_authenticated` has run
    pub fn is_sealed(&self) -> bool {
        self.sealed.is_some()
    }

    /// Fold a contributor identity into the filter
    ///
    /// Never fails. On a sealed transaction the identity is dropped and the
    /// filter left as embedded; use [`Transaction::try_update`] to be told.
    pub fn update(&mut self, identity: &str) {
        if let Err(err) = self.try_update(identity) {
            warn!(error = %err, "Ignoring identity folded after sealing");
        }
    }

    /// Fold a contributor identity, rejecting it once the transaction is sealed
    pub fn try_update(&mut self, identity: &str) -> Result<(), TagError> {
        self.ensure_open()?;
        self.filter.update(identity);
        Ok(())
    }

    /// OR another filter's bits into this transaction's filter
    pub fn merge_filter(&mut self, other: &MembershipFilter) -> Result<(), TagError> {
        self.ensure_open()?;
        self.filter.merge(other)
    }

    /// Set `payload = prefix ++ render(filter)`
    ///
    /// The prefix is not validated. The whole payload is replaced, so tagging
    /// again rewrites the suffix instead of stacking a second one.
    pub fn tag(&mut self, prefix: &[u8]) {
        self.payload = TaggedPayload::plain(prefix, self.filter.clone()).to_bytes();
        self.sealed = Some(TagMode::Plain);
    }

    /// Trailing M bytes of the payload, i.e. the plain-tagged filter
    ///
    /// No authentication happens here: anyone can rewrite these bytes.
    pub fn untag(&self) -> Result<Cow<'_, str>, TagError> {
        untag_payload(&self.payload, self.filter.width()).map(String::from_utf8_lossy)
    }

    /// Append `render(filter) ++ SHA256(SHA256(render(filter)))` to the payload
    ///
    /// Fails with `AlreadySealed` on a transaction that was already sealed.
    pub fn tag_authenticated(&mut self) -> Result<(), TagError> {
        self.ensure_open()?;
        let data = mem::take(&mut self.payload);
        self.payload = TaggedPayload::authenticated(data, self.filter.clone()).to_bytes();
        self.sealed = Some(TagMode::Authenticated);
        Ok(())
    }

    /// Verify and extract the filter from this transaction's authenticated payload
    pub fn extract_and_verify(&self) -> Result<MembershipFilter, TagError> {
        extract_and_verify(&self.payload, self.filter.config())
    }

    /// Decompose into filter and payload
    pub fn into_parts(self) -> (MembershipFilter, Vec<u8>) {
        (self.filter, self.payload)
    }

    fn ensure_open(&self) -> Result<(), TagError> {
        match self.sealed {
            Some(mode) => Err(TagError::AlreadySealed { mode }),
            None => Ok(()),
        }
    }
}

/// Trailing `width` bytes of a plain-tagged payload
pub fn untag_payload(payload: &[u8], width: usize) -> Result<&[u8], TagError> {
    if payload.len() < width {
        return Err(TagError::TruncatedPayload {
            actual: payload.len(),
            required: width,
        });
    }
    Ok(&payload[payload.len() - width..])
}

/// Recover the filter from an authenticated payload
///
/// Read-only. Fails with `TruncatedPayload` when the payload is shorter than
/// `M + 32` bytes, `IntegrityMismatch` when the recomputed digest differs from
/// the stored one, and `Format` when authenticated bytes are not a bit-string.
pub fn extract_and_verify(payload: &[u8], config: &FilterConfig) -> Result<MembershipFilter, TagError> {
    split_authenticated(payload, config).map(|(_, filter, _)| filter)
}

fn split_authenticated<'a>(
    bytes: &'a [u8],
    config: &FilterConfig,
) -> Result<(&'a [u8], MembershipFilter, IntegrityDigest), TagError> {
    config.validate()?;

    let required = config.authenticated_suffix_len();
    if bytes.len() < required {
        return Err(TagError::TruncatedPayload {
            actual: bytes.len(),
            required,
        });
    }

    let digest_start = bytes.len() - DIGEST_LEN;
    let filter_start = digest_start - config.width;

    let stored = IntegrityDigest::from_slice(&bytes[digest_start..])?;
    let filter_bytes = &bytes[filter_start..digest_start];
    let expected = IntegrityDigest::compute(filter_bytes);

    if expected != stored {
        return Err(TagError::IntegrityMismatch {
            expected: expected.to_hex(),
            found: stored.to_hex(),
        });
    }

    let filter = MembershipFilter::parse_bytes(filter_bytes, config)?;
    Ok((&bytes[..filter_start], filter, stored))
}
