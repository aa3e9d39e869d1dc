//! Fixed-width membership filter over share identities
//!
//! INVARIANTS:
//! - The bit array width is fixed at construction.
//! - Bits only transition 0 -> 1; nothing clears a filter.
//! - `parse(render(f)) == f` for every filter.
//!
//! The canonical text form renders the most significant position first:
//! character `j` of the rendered string is bit `M - 1 - j`.

use std::fmt;
use std::str::FromStr;

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::{FilterConfig, HashAlgorithm, UpdateStrategy};
use super::hash_functions::{derive_indices, for_each_index};
use crate::error::{FormatError, TagError};

/// Bloom filter summarising which share identities contributed to a transaction
///
/// Equality compares the bits and the derivation (width, rounds, hash). The
/// update strategy is not part of a filter's identity: both strategies set
/// the same bits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "FilterRepr", into = "FilterRepr")]
pub struct MembershipFilter {
    /// Bit array, index = bit position
    bits: BitVec<u8, Lsb0>,
    /// Geometry and hashing used to fold identities in
    config: FilterConfig,
}

impl MembershipFilter {
    /// Create an all-zero filter with the default geometry (M=48, K=17)
    pub fn new() -> Self {
        Self::zeroed(FilterConfig::default())
    }

    /// Create an all-zero filter with a custom configuration
    pub fn with_config(config: &FilterConfig) -> Result<Self, TagError> {
        config.validate()?;
        Ok(Self::zeroed(*config))
    }

    /// Zeroed filter for an already validated configuration
    pub(crate) fn zeroed(config: FilterConfig) -> Self {
        Self {
            bits: bitvec![u8, Lsb0; 0; config.width],
            config,
        }
    }

    /// Fold an identity string into the filter
    ///
    /// Sets `hash(decimal(i) ++ identity) mod M` for every round `i` in `0..K`.
    /// Any string is accepted, including the empty string.
    pub fn update(&mut self, identity: &str) {
        let config = self.config;
        match config.strategy {
            UpdateStrategy::ApplyAsDerived => {
                let bits = &mut self.bits;
                for_each_index(identity, &config, |idx| bits.set(idx, true));
            }
            UpdateStrategy::Batched => {
                for idx in derive_indices(identity, &config) {
                    self.bits.set(idx, true);
                }
            }
        }
    }

    /// Test whether an identity might have been folded in
    ///
    /// Never returns `false` for an identity passed to `update`.
    pub fn contains(&self, identity: &str) -> bool {
        derive_indices(identity, &self.config)
            .into_iter()
            .all(|idx| self.bits[idx])
    }

    /// Canonical bit-string, most significant position first, exactly M characters
    pub fn render(&self) -> String {
        (0..self.width())
            .rev()
            .map(|pos| if self.bits[pos] { '1' } else { '0' })
            .collect()
    }

    /// Parse a bit-string produced by `render` using the default configuration
    ///
    /// The text form carries no derivation parameters. A filter built with a
    /// non-default width, rounds or hash must be read back with
    /// [`MembershipFilter::parse_with`] and its own configuration, otherwise
    /// `contains` answers against the wrong indices.
    pub fn parse(s: &str) -> Result<Self, TagError> {
        Self::parse_bytes(s.as_bytes(), &FilterConfig::default())
    }

    /// Parse a bit-string with a custom configuration
    pub fn parse_with(s: &str, config: &FilterConfig) -> Result<Self, TagError> {
        Self::parse_bytes(s.as_bytes(), config)
    }

    /// Parse raw payload bytes holding a rendered filter
    pub fn parse_bytes(bytes: &[u8], config: &FilterConfig) -> Result<Self, TagError> {
        config.validate()?;

        if bytes.len() != config.width {
            return Err(FormatError::WrongLength {
                expected: config.width,
                actual: bytes.len(),
            }
            .into());
        }

        let mut filter = Self::zeroed(*config);
        for (position, &byte) in bytes.iter().enumerate() {
            match byte {
                b'0' => {}
                b'1' => filter.bits.set(config.width - 1 - position, true),
                _ => return Err(FormatError::InvalidCharacter { position, byte }.into()),
            }
        }

        Ok(filter)
    }

    /// Merge another filter into this one (OR operation)
    ///
    /// The result matches every identity folded into either filter.
    pub fn merge(&mut self, other: &MembershipFilter) -> Result<(), TagError> {
        if self.config.width != other.config.width
            || self.config.rounds != other.config.rounds
            || self.config.hash != other.config.hash
        {
            return Err(TagError::IncompatibleFilters {
                left: self.config.width,
                right: other.config.width,
                left_rounds: self.config.rounds,
                right_rounds: other.config.rounds,
            });
        }

        let self_raw = self.bits.as_raw_mut_slice();
        let other_raw = other.bits.as_raw_slice();
        for (s, o) in self_raw.iter_mut().zip(other_raw.iter()) {
            *s |= *o;
        }
        Ok(())
    }

    /// Number of bits set
    pub fn bits_set(&self) -> usize {
        self.bits.count_ones()
    }

    /// Whether bit `position` is set (positions past the width read as unset)
    pub fn is_set(&self, position: usize) -> bool {
        self.bits.get(position).map(|bit| *bit).unwrap_or(false)
    }

    /// Set bit positions in ascending order
    pub fn set_positions(&self) -> Vec<usize> {
        self.bits.iter_ones().collect()
    }

    /// True when no identity has been folded in
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Filter width in bits (M)
    pub fn width(&self) -> usize {
        self.config.width
    }

    /// Derivation rounds per identity (K)
    pub fn rounds(&self) -> usize {
        self.config.rounds
    }

    /// Derivation hash
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.config.hash
    }

    /// Full configuration
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Set a single position; out-of-range positions are ignored
    pub(crate) fn set_position(&mut self, position: usize) {
        if position < self.config.width {
            self.bits.set(position, true);
        }
    }
}

impl PartialEq for MembershipFilter {
    fn eq(&self, other: &Self) -> bool {
        self.config.width == other.config.width
            && self.config.rounds == other.config.rounds
            && self.config.hash == other.config.hash
            && self.bits == other.bits
    }
}

impl Eq for MembershipFilter {}

impl Default for MembershipFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MembershipFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Parses with the default configuration, like [`MembershipFilter::parse`]
impl FromStr for MembershipFilter {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Serde shape: the rendered bit-string plus derivation parameters
#[derive(Serialize, Deserialize)]
struct FilterRepr {
    bits: String,
    rounds: usize,
    hash: HashAlgorithm,
    strategy: UpdateStrategy,
}

impl From<MembershipFilter> for FilterRepr {
    fn from(filter: MembershipFilter) -> Self {
        Self {
            bits: filter.render(),
            rounds: filter.config.rounds,
            hash: filter.config.hash,
            strategy: filter.config.strategy,
        }
    }
}

impl TryFrom<FilterRepr> for MembershipFilter {
    type Error = TagError;

    fn try_from(repr: FilterRepr) -> Result<Self, Self::Error> {
        let config = FilterConfig {
            width: repr.bits.len(),
            rounds: repr.rounds,
            hash: repr.hash,
            strategy: repr.strategy,
        };
        Self::parse_bytes(repr.bits.as_bytes(), &config)
    }
}
