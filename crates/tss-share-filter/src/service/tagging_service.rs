//! Tagging Service
//!
//! Orchestrates domain logic: resolves share identities through the
//! outbound port, folds them into transaction filters, seals payloads and
//! verifies them, recording logs and metrics along the way.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{
    extract_and_verify, ConcurrentFilter, FilterConfig, MembershipFilter, TagMode, TaggedPayload,
    Transaction,
};
use crate::error::TagError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{ShareIdentity, ShareTaggingApi};

/// Tagging Service implementation
///
/// Implements the `ShareTaggingApi` port for one filter configuration.
pub struct TaggingService<M: MetricsRecorder = NoOpMetrics> {
    /// Validated filter configuration
    config: FilterConfig,
    /// Metrics sink
    metrics: Arc<M>,
}

impl TaggingService<NoOpMetrics> {
    /// Create a service without metrics
    pub fn new(config: FilterConfig) -> Result<Self, TagError> {
        Self::with_metrics(config, Arc::new(NoOpMetrics))
    }
}

impl<M: MetricsRecorder> TaggingService<M> {
    /// Create a service reporting to the given metrics recorder
    pub fn with_metrics(config: FilterConfig, metrics: Arc<M>) -> Result<Self, TagError> {
        config.validate()?;
        Ok(Self { config, metrics })
    }

    /// Metrics recorder
    pub fn metrics(&self) -> &Arc<M> {
        &self.metrics
    }

    fn observe(
        &self,
        mode: TagMode,
        payload_len: usize,
        result: Result<MembershipFilter, TagError>,
    ) -> Result<MembershipFilter, TagError> {
        let operation = match mode {
            TagMode::Plain => "preview",
            TagMode::Authenticated => "verify",
        };
        match &result {
            Ok(filter) => {
                match mode {
                    TagMode::Plain => self.metrics.record_previewed(),
                    TagMode::Authenticated => self.metrics.record_verified(),
                }
                debug!(
                    operation,
                    payload_len,
                    bits_set = filter.bits_set(),
                    "Extracted transaction filter"
                );
            }
            Err(err) => {
                self.metrics.record_rejection(err);
                warn!(operation, payload_len, error = %err, "Rejected tagged payload");
            }
        }
        result
    }
}

/// Even share of `total` across `count` items, zero when there are none
fn average_duration(total: Duration, count: usize) -> Duration {
    match count {
        0 => Duration::ZERO,
        n => total / u32::try_from(n).unwrap_or(u32::MAX),
    }
}

impl<M: MetricsRecorder> ShareTaggingApi for TaggingService<M> {
    fn config(&self) -> &FilterConfig {
        &self.config
    }

    fn open_transaction(&self, data: &[u8]) -> Transaction {
        Transaction::from_parts(MembershipFilter::zeroed(self.config), data)
    }

    fn fold_share(&self, tx: &mut Transaction, share: &dyn ShareIdentity) -> Result<(), TagError> {
        let identity = share.identity()?;

        let start = Instant::now();
        tx.try_update(&identity)?;
        self.metrics.record_fold(start.elapsed());

        debug!(
            identity_len = identity.len(),
            bits_set = tx.filter().bits_set(),
            "Folded share into transaction filter"
        );
        Ok(())
    }

    fn fold_shares_parallel(
        &self,
        tx: &mut Transaction,
        shares: &[&(dyn ShareIdentity + Sync)],
    ) -> Result<(), TagError> {
        let identities: Vec<String> = shares
            .par_iter()
            .map(|share| share.identity())
            .collect::<Result<_, TagError>>()?;

        let shared = ConcurrentFilter::from_filter(tx.filter())?;
        let start = Instant::now();
        shared.update_all(&identities);
        tx.merge_filter(&shared.snapshot())?;

        let per_identity = average_duration(start.elapsed(), identities.len());
        for _ in &identities {
            self.metrics.record_fold(per_identity);
        }

        debug!(
            shares = identities.len(),
            bits_set = tx.filter().bits_set(),
            "Folded shares in parallel"
        );
        Ok(())
    }

    fn seal(&self, tx: &mut Transaction, mode: TagMode) -> Result<(), TagError> {
        if let Some(sealed) = tx.sealed_mode() {
            warn!(?mode, ?sealed, "Refusing to seal a transaction twice");
            return Err(TagError::AlreadySealed { mode: sealed });
        }
        match mode {
            TagMode::Plain => {
                let prefix = tx.payload().to_vec();
                tx.tag(&prefix);
            }
            TagMode::Authenticated => tx.tag_authenticated()?,
        }
        self.metrics.record_sealed(mode);

        debug!(
            ?mode,
            payload_len = tx.payload().len(),
            filter = %tx.filter(),
            "Sealed transaction payload"
        );
        Ok(())
    }

    fn preview(&self, payload: &[u8]) -> Result<MembershipFilter, TagError> {
        let result = TaggedPayload::decode_plain(payload, &self.config).map(|tagged| {
            let (_, filter, _) = tagged.into_parts();
            filter
        });
        self.observe(TagMode::Plain, payload.len(), result)
    }

    fn verify(&self, payload: &[u8]) -> Result<MembershipFilter, TagError> {
        let result = extract_and_verify(payload, &self.config);
        self.observe(TagMode::Authenticated, payload.len(), result)
    }

    fn verify_batch(&self, payloads: &[&[u8]]) -> Vec<Result<MembershipFilter, TagError>> {
        payloads.par_iter().map(|payload| self.verify(payload)).collect()
    }

    fn contains_share(
        &self,
        filter: &MembershipFilter,
        share: &dyn ShareIdentity,
    ) -> Result<bool, TagError> {
        let identity = share.identity()?;
        Ok(filter.contains(&identity))
    }
}
