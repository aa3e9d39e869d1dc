//! # Share Registry (Cuckoo Filter)
//!
//! Deletion-capable membership set for share identities.
//!
//! A transaction's Bloom filter only ever grows. When the set of live
//! contributors has to shrink (a share is revoked or rotated out), the
//! registry tracks it instead: it answers the same "possibly present /
//! definitely absent" question but supports removal.
//!
//! | Feature | MembershipFilter | ShareRegistry |
//! |---------|------------------|---------------|
//! | Deletion | No | Yes |
//! | Fixed wire width | Yes (M bits) | No |
//! | Embedded in payloads | Yes | No |
//!
//! Fingerprints and bucket indices come from SHA-256 of the identity;
//! the alternate bucket uses partial-key cuckoo hashing.

use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::TagError;

/// Entries per bucket.
pub const ENTRIES_PER_BUCKET: usize = 4;

/// Maximum number of relocations before giving up.
const MAX_KICKS: usize = 500;

/// Non-zero 16-bit fingerprint; zero marks an empty slot.
pub type Fingerprint = u16;

/// A bucket containing multiple fingerprints.
#[derive(Clone, Debug, Default)]
pub struct Bucket {
    entries: [Fingerprint; ENTRIES_PER_BUCKET],
}

impl Bucket {
    /// Insert fingerprint if there's an empty slot.
    pub fn insert(&mut self, fp: Fingerprint) -> bool {
        for entry in &mut self.entries {
            if *entry == 0 {
                *entry = fp;
                return true;
            }
        }
        false
    }

    /// Check if fingerprint exists.
    pub fn contains(&self, fp: Fingerprint) -> bool {
        self.entries.iter().any(|&e| e == fp)
    }

    /// Delete one copy of a fingerprint if it exists.
    pub fn delete(&mut self, fp: Fingerprint) -> bool {
        for entry in &mut self.entries {
            if *entry == fp {
                *entry = 0;
                return true;
            }
        }
        false
    }

    /// Put `fp` into `slot`, returning what was there.
    fn replace(&mut self, slot: usize, fp: Fingerprint) -> Fingerprint {
        std::mem::replace(&mut self.entries[slot], fp)
    }
}

/// Cuckoo filter over share identities.
#[derive(Clone, Debug)]
pub struct ShareRegistry {
    buckets: Vec<Bucket>,
    bucket_count: usize,
    count: usize,
}

impl ShareRegistry {
    /// Create a registry able to hold roughly `capacity` identities.
    ///
    /// The bucket count is rounded up to a power of two, minimum 4.
    pub fn new(capacity: usize) -> Self {
        let bucket_count = capacity.div_ceil(ENTRIES_PER_BUCKET);
        let bucket_count = bucket_count.next_power_of_two().max(4);

        Self {
            buckets: vec![Bucket::default(); bucket_count],
            bucket_count,
            count: 0,
        }
    }

    /// Register an identity.
    ///
    /// Registering the same identity twice stores two fingerprints; each
    /// `remove` drops one. When no slot can be freed within the relocation
    /// budget every move is undone and `FilterFull` is returned, so existing
    /// entries are never lost.
    pub fn insert(&mut self, identity: &str) -> Result<(), TagError> {
        let (fp, i1, i2) = self.indices(identity);

        if self.buckets[i1].insert(fp) || self.buckets[i2].insert(fp) {
            self.count += 1;
            return Ok(());
        }

        self.relocate(fp, i1)
    }

    fn relocate(&mut self, fp: Fingerprint, start: usize) -> Result<(), TagError> {
        let mut rng = rand::thread_rng();
        let mut journal: Vec<(usize, usize, Fingerprint)> = Vec::with_capacity(MAX_KICKS);
        let mut fp = fp;
        let mut idx = start;

        for _ in 0..MAX_KICKS {
            let slot = rng.gen_range(0..ENTRIES_PER_BUCKET);
            let evicted = self.buckets[idx].replace(slot, fp);
            journal.push((idx, slot, evicted));

            fp = evicted;
            idx = self.alt_index(idx, fp);

            if self.buckets[idx].insert(fp) {
                self.count += 1;
                return Ok(());
            }
        }

        for (bucket, slot, previous) in journal.into_iter().rev() {
            self.buckets[bucket].replace(slot, previous);
        }

        warn!(
            capacity = self.capacity(),
            count = self.count,
            "Share registry full, relocation budget exhausted"
        );
        Err(TagError::FilterFull {
            capacity: self.capacity(),
        })
    }

    /// Check if an identity might be registered.
    pub fn contains(&self, identity: &str) -> bool {
        let (fp, i1, i2) = self.indices(identity);
        self.buckets[i1].contains(fp) || self.buckets[i2].contains(fp)
    }

    /// Remove an identity.
    ///
    /// Returns `true` if a matching fingerprint was removed. Only remove
    /// identities that were registered; removing a colliding stranger
    /// introduces a false negative for the real owner.
    pub fn remove(&mut self, identity: &str) -> bool {
        let (fp, i1, i2) = self.indices(identity);

        if self.buckets[i1].delete(fp) || self.buckets[i2].delete(fp) {
            self.count = self.count.saturating_sub(1);
            return true;
        }

        false
    }

    /// Number of registered fingerprints.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Total slots.
    pub fn capacity(&self) -> usize {
        self.bucket_count * ENTRIES_PER_BUCKET
    }

    /// Fraction of occupied slots.
    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.capacity() as f64
    }

    /// Fingerprint and both candidate buckets for an identity.
    fn indices(&self, identity: &str) -> (Fingerprint, usize, usize) {
        let digest = Sha256::digest(identity.as_bytes());

        let fp = Fingerprint::from_be_bytes([digest[0], digest[1]]);
        let fp = if fp == 0 { 1 } else { fp };

        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[8..16]);
        let i1 = (u64::from_be_bytes(word) as usize) % self.bucket_count;
        let i2 = self.alt_index(i1, fp);
        (fp, i1, i2)
    }

    /// Partial-key cuckoo hashing: `i2 = i1 xor hash(fp)`.
    ///
    /// The bucket count is a power of two, so applying this twice returns
    /// the starting bucket.
    fn alt_index(&self, idx: usize, fp: Fingerprint) -> usize {
        let digest = Sha256::digest(fp.to_be_bytes());
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);
        (idx ^ u64::from_be_bytes(word) as usize) % self.bucket_count
    }
}
