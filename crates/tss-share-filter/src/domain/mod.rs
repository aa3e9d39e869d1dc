//! Domain Layer - Pure business logic
//!
//! This layer contains:
//! - Filter configuration
//! - Hash-to-index derivation
//! - Membership filter and its lock-free shared variant
//! - Integrity digest
//! - Transaction tagging (plain and authenticated)
//! - Share registry (deletion-capable cuckoo filter)
//!
//! RULES:
//! - No I/O operations
//! - No async code
//! - No process-global mutable state

pub mod concurrent_filter;
pub mod config;
pub mod digest;
pub mod hash_functions;
pub mod membership_filter;
pub mod share_registry;
pub mod transaction;

pub use concurrent_filter::ConcurrentFilter;
pub use config::{
    FilterConfig, FilterConfigBuilder, HashAlgorithm, UpdateStrategy, DEFAULT_ROUNDS,
    DEFAULT_WIDTH, DIGEST_LEN,
};
pub use digest::IntegrityDigest;
pub use hash_functions::{derive_indices, string_hash};
pub use membership_filter::MembershipFilter;
pub use share_registry::{ShareRegistry, ENTRIES_PER_BUCKET};
pub use transaction::{extract_and_verify, untag_payload, TagMode, TaggedPayload, Transaction};
