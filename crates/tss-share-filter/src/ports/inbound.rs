//! Inbound Ports (Driving Ports)
//!
//! The API signing coordinators use to tag a transaction with the shares
//! that contributed to it, and verifiers use to read the tag back.

use crate::domain::{FilterConfig, MembershipFilter, TagMode, Transaction};
use crate::error::TagError;
use crate::ports::outbound::ShareIdentity;

/// Primary tagging API (Driving Port)
pub trait ShareTaggingApi: Send + Sync {
    /// Configuration every transaction opened by this API uses
    fn config(&self) -> &FilterConfig;

    /// Start a transaction over application data with an empty filter
    fn open_transaction(&self, data: &[u8]) -> Transaction;

    /// Fold one share's identity into the transaction's filter
    fn fold_share(&self, tx: &mut Transaction, share: &dyn ShareIdentity) -> Result<(), TagError>;

    /// Fold many shares concurrently
    ///
    /// Identities are resolved and folded in parallel into a lock-free
    /// shared filter, then merged into the transaction. Fails without
    /// touching the transaction if any identity cannot be produced.
    fn fold_shares_parallel(
        &self,
        tx: &mut Transaction,
        shares: &[&(dyn ShareIdentity + Sync)],
    ) -> Result<(), TagError>;

    /// Append the filter suffix to the payload
    ///
    /// `TagMode::Plain` appends the bit-string only; `TagMode::Authenticated`
    /// also appends the double-SHA-256 digest. A transaction is sealed at
    /// most once; a second call fails with `AlreadySealed`.
    fn seal(&self, tx: &mut Transaction, mode: TagMode) -> Result<(), TagError>;

    /// Read a plain-tagged filter without any authentication
    fn preview(&self, payload: &[u8]) -> Result<MembershipFilter, TagError>;

    /// Verify and extract the filter from an authenticated payload
    fn verify(&self, payload: &[u8]) -> Result<MembershipFilter, TagError>;

    /// Verify independent payloads in parallel, preserving input order
    fn verify_batch(&self, payloads: &[&[u8]]) -> Vec<Result<MembershipFilter, TagError>>;

    /// Check whether a share might have contributed to a filter
    fn contains_share(
        &self,
        filter: &MembershipFilter,
        share: &dyn ShareIdentity,
    ) -> Result<bool, TagError>;
}
