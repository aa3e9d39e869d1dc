//! Hash-to-index derivation
//!
//! For identity `s` and round `i` in `0..K` the index is
//! `hash(decimal(i) ++ s) mod M`. The hash is seedless so the same identity
//! maps to the same positions in every process.

use std::hash::Hasher;
use std::io::Cursor;

use siphasher::sip::SipHasher13;

use super::config::{FilterConfig, HashAlgorithm};

/// MurmurHash3 x64/128 with seed 0, lower 64 bits
pub fn murmur_hash(bytes: &[u8]) -> u64 {
    let mut cursor = Cursor::new(bytes);
    // Reading from an in-memory cursor cannot fail
    let hash = murmur3::murmur3_x64_128(&mut cursor, 0).unwrap_or(0);
    hash as u64
}

/// SipHash-1-3 with zero keys
pub fn sip_hash(bytes: &[u8]) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write(bytes);
    hasher.finish()
}

/// Hash a byte string with the selected algorithm
pub fn string_hash(algorithm: HashAlgorithm, bytes: &[u8]) -> u64 {
    match algorithm {
        HashAlgorithm::Murmur3 => murmur_hash(bytes),
        HashAlgorithm::SipHash13 => sip_hash(bytes),
    }
}

/// Input for derivation round `round`: the round's decimal text followed by the identity
pub fn round_input(round: usize, identity: &str) -> Vec<u8> {
    let prefix = round.to_string();
    let mut input = Vec::with_capacity(prefix.len() + identity.len());
    input.extend_from_slice(prefix.as_bytes());
    input.extend_from_slice(identity.as_bytes());
    input
}

/// Index produced by a single round
pub fn index_for_round(identity: &str, round: usize, width: usize, algorithm: HashAlgorithm) -> usize {
    let hash = string_hash(algorithm, &round_input(round, identity));
    (hash % width as u64) as usize
}

/// Stream every round's index to `apply` as soon as it is derived
pub fn for_each_index<F>(identity: &str, config: &FilterConfig, mut apply: F)
where
    F: FnMut(usize),
{
    for round in 0..config.rounds {
        apply(index_for_round(identity, round, config.width, config.hash));
    }
}

/// Derive all K indices for an identity into a fresh buffer
///
/// Duplicates are kept; the buffer always has `config.rounds` entries.
pub fn derive_indices(identity: &str, config: &FilterConfig) -> Vec<usize> {
    let mut indices = Vec::with_capacity(config.rounds);
    for_each_index(identity, config, |idx| indices.push(idx));
    indices
}
