//! # Concurrent Filter
//!
//! Shared filter for parallel share submission.
//!
//! Bits live in `AtomicU64` words and every derived index is set with
//! `fetch_or`, so contributors folding identities at the same time never
//! overwrite each other. Take a [`ConcurrentFilter::snapshot`] once all
//! contributors are done to obtain a plain [`MembershipFilter`] for tagging.

use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use super::config::FilterConfig;
use super::hash_functions::for_each_index;
use super::membership_filter::MembershipFilter;
use crate::error::TagError;

const WORD_BITS: usize = 64;

/// Lock-free filter shared between contributors
#[derive(Debug)]
pub struct ConcurrentFilter {
    words: Vec<AtomicU64>,
    config: FilterConfig,
}

impl ConcurrentFilter {
    /// Create an all-zero shared filter
    pub fn new(config: &FilterConfig) -> Result<Self, TagError> {
        config.validate()?;
        let word_count = config.width.div_ceil(WORD_BITS);

        Ok(Self {
            words: (0..word_count).map(|_| AtomicU64::new(0)).collect(),
            config: *config,
        })
    }

    /// Seed a shared filter from an existing filter's bits
    pub fn from_filter(filter: &MembershipFilter) -> Result<Self, TagError> {
        let shared = Self::new(filter.config())?;
        for pos in filter.set_positions() {
            shared.set_position(pos);
        }
        Ok(shared)
    }

    /// Fold an identity in; safe to call from many threads at once
    pub fn update(&self, identity: &str) {
        for_each_index(identity, &self.config, |idx| self.set_position(idx));
    }

    /// Fold many identities in parallel
    pub fn update_all<S>(&self, identities: &[S])
    where
        S: AsRef<str> + Sync,
    {
        identities
            .par_iter()
            .for_each(|identity| self.update(identity.as_ref()));
    }

    /// Copy the current bits into a plain filter
    pub fn snapshot(&self) -> MembershipFilter {
        let mut filter = MembershipFilter::zeroed(self.config);

        for (word_idx, word) in self.words.iter().enumerate() {
            let mut value = word.load(Ordering::Acquire);
            while value != 0 {
                let bit = value.trailing_zeros() as usize;
                filter.set_position(word_idx * WORD_BITS + bit);
                value &= value - 1;
            }
        }

        filter
    }

    /// Filter configuration
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    fn set_position(&self, position: usize) {
        let word = position / WORD_BITS;
        let mask = 1u64 << (position % WORD_BITS);
        self.words[word].fetch_or(mask, Ordering::AcqRel);
    }
}
