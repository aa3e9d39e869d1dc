//! # TSS Share Filter
//!
//! Tags a transaction payload with a compact Bloom filter recording which
//! threshold-RSA signing shares contributed to it, optionally sealed with a
//! double-SHA-256 digest so tampering with the filter is detectable.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure business logic, no I/O
//!   - `MembershipFilter`: M-bit filter with MSB-first text form
//!   - `ConcurrentFilter`: Lock-free shared filter for parallel folding
//!   - `Transaction` / `TaggedPayload`: Plain and authenticated suffix layouts
//!   - `IntegrityDigest`: SHA256(SHA256(rendered filter))
//!   - `ShareRegistry`: Cuckoo filter for share sets that need deletion
//!   - `FilterConfig`: Geometry and hashing with validation
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `ShareTaggingApi`: Driving port (inbound API)
//!   - `ShareIdentity`: Driven port (share records from the signing library)
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `TaggingService`: Implements `ShareTaggingApi`
//!
//! ## Wire Layout
//!
//! ```text
//! plain:          data ++ render(filter)
//! authenticated:  data ++ render(filter) ++ SHA256(SHA256(render(filter)))
//! ```
//!
//! `render` writes one ASCII `'0'`/`'1'` per bit, most significant bit
//! first. Index `i` of an identity is `hash(decimal(i) ++ identity) mod M`
//! for `i` in `0..K`, with M = 48 and K = 17 by default.
//!
//! ## Invariants
//!
//! - No false negatives: once folded, `contains()` is true for an identity
//! - Folding is monotone: bits are only ever set, never cleared
//! - `parse_with(render(f), f.config()) == f` for every filter
//! - A sealed transaction's filter no longer changes
//! - A single changed byte in an authenticated suffix fails verification
//!
//! ## Usage Example
//!
//! ```ignore
//! use tss_share_filter::{FilterConfig, ShareTaggingApi, TagMode, TaggingService};
//!
//! let service = TaggingService::new(FilterConfig::from_env())?;
//!
//! let mut tx = service.open_transaction(b"random_data");
//! service.fold_share(&mut tx, &"{\"i\":1,\"si\":\"...\"}")?;
//! service.seal(&mut tx, TagMode::Authenticated)?;
//!
//! let filter = service.verify(tx.payload())?;
//! assert!(service.contains_share(&filter, &"{\"i\":1,\"si\":\"...\"}")?);
//! ```

pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use domain::{
    derive_indices, extract_and_verify, untag_payload, ConcurrentFilter, FilterConfig,
    FilterConfigBuilder, HashAlgorithm, IntegrityDigest, MembershipFilter, ShareRegistry,
    TagMode, TaggedPayload, Transaction, UpdateStrategy, DEFAULT_ROUNDS, DEFAULT_WIDTH,
    DIGEST_LEN,
};
pub use error::{FormatError, TagError};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{JsonShare, ShareIdentity, ShareTaggingApi};
pub use service::TaggingService;
