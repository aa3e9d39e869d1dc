//! Filter geometry and hashing configuration
//!
//! # Example
//!
//! ```ignore
//! use tss_share_filter::domain::{FilterConfigBuilder, HashAlgorithm};
//!
//! let config = FilterConfigBuilder::new()
//!     .width(64)
//!     .rounds(9)
//!     .hash(HashAlgorithm::SipHash13)
//!     .build()?;
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::TagError;
use serde::{Deserialize, Serialize};

/// Width of the filter in bits (M)
pub const DEFAULT_WIDTH: usize = 48;

/// Number of index derivations per identity (K)
pub const DEFAULT_ROUNDS: usize = 17;

/// Length of the integrity digest appended by authenticated tagging
pub const DIGEST_LEN: usize = 32;

/// Upper bound accepted for `width`
pub const MAX_WIDTH: usize = 4096;

/// Upper bound accepted for `rounds`
pub const MAX_ROUNDS: usize = 64;

/// Seedless string hash used for index derivation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// MurmurHash3 x64/128, lower 64 bits, seed 0
    #[default]
    Murmur3,
    /// SipHash-1-3 with zero keys
    SipHash13,
}

impl FromStr for HashAlgorithm {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "murmur3" | "murmur" => Ok(HashAlgorithm::Murmur3),
            "siphash" | "siphash13" | "sip" => Ok(HashAlgorithm::SipHash13),
            other => Err(TagError::InvalidParameters(format!(
                "unknown hash algorithm: {other}"
            ))),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Murmur3 => f.write_str("murmur3"),
            HashAlgorithm::SipHash13 => f.write_str("siphash13"),
        }
    }
}

/// How derived indices are applied to the bit array
///
/// Both strategies produce identical filter state because bits are never
/// cleared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// Set each bit as soon as its index is derived
    #[default]
    ApplyAsDerived,
    /// Derive all K indices for one identity, then set them
    Batched,
}

impl FromStr for UpdateStrategy {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "apply" | "apply_as_derived" => Ok(UpdateStrategy::ApplyAsDerived),
            "batch" | "batched" => Ok(UpdateStrategy::Batched),
            other => Err(TagError::InvalidParameters(format!(
                "unknown update strategy: {other}"
            ))),
        }
    }
}

/// Filter configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Filter width in bits (M)
    pub width: usize,
    /// Index derivations per identity (K)
    pub rounds: usize,
    /// String hash used for derivation
    pub hash: HashAlgorithm,
    /// Index application strategy
    pub strategy: UpdateStrategy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            rounds: DEFAULT_ROUNDS,
            hash: HashAlgorithm::Murmur3,
            strategy: UpdateStrategy::ApplyAsDerived,
        }
    }
}

impl FilterConfig {
    /// Create a new configuration with validation
    pub fn new(
        width: usize,
        rounds: usize,
        hash: HashAlgorithm,
        strategy: UpdateStrategy,
    ) -> Result<Self, TagError> {
        let config = Self {
            width,
            rounds,
            hash,
            strategy,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TSS_FILTER_WIDTH`: filter width in bits (default: 48)
    /// - `TSS_FILTER_ROUNDS`: derivations per identity (default: 17)
    /// - `TSS_FILTER_HASH`: `murmur3` or `siphash` (default: murmur3)
    /// - `TSS_FILTER_STRATEGY`: `apply` or `batch` (default: apply)
    ///
    /// Missing or unparsable values fall back to the defaults. The result is
    /// not validated; call [`FilterConfig::validate`] before use.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            width: env::var("TSS_FILTER_WIDTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.width),

            rounds: env::var("TSS_FILTER_ROUNDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rounds),

            hash: env::var("TSS_FILTER_HASH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.hash),

            strategy: env::var("TSS_FILTER_STRATEGY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.strategy),
        }
    }

    /// Validate geometry bounds
    pub fn validate(&self) -> Result<(), TagError> {
        if self.width == 0 || self.width > MAX_WIDTH {
            return Err(TagError::InvalidParameters(format!(
                "width must be between 1 and {MAX_WIDTH}, got {}",
                self.width
            )));
        }

        if self.rounds == 0 || self.rounds > MAX_ROUNDS {
            return Err(TagError::InvalidParameters(format!(
                "rounds must be between 1 and {MAX_ROUNDS}, got {}",
                self.rounds
            )));
        }

        Ok(())
    }

    /// Length of the suffix appended by plain tagging
    pub fn plain_suffix_len(&self) -> usize {
        self.width
    }

    /// Length of the suffix appended by authenticated tagging
    pub fn authenticated_suffix_len(&self) -> usize {
        self.width + DIGEST_LEN
    }
}

/// Builder for FilterConfig with validation
#[derive(Default)]
pub struct FilterConfigBuilder {
    width: Option<usize>,
    rounds: Option<usize>,
    hash: Option<HashAlgorithm>,
    strategy: Option<UpdateStrategy>,
}

impl FilterConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set filter width in bits
    pub fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Set number of derivation rounds
    pub fn rounds(mut self, rounds: usize) -> Self {
        self.rounds = Some(rounds);
        self
    }

    /// Set the derivation hash
    pub fn hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = Some(hash);
        self
    }

    /// Set the update strategy
    pub fn strategy(mut self, strategy: UpdateStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Build the FilterConfig, validating all parameters
    pub fn build(self) -> Result<FilterConfig, TagError> {
        let defaults = FilterConfig::default();

        FilterConfig::new(
            self.width.unwrap_or(defaults.width),
            self.rounds.unwrap_or(defaults.rounds),
            self.hash.unwrap_or(defaults.hash),
            self.strategy.unwrap_or(defaults.strategy),
        )
    }
}
