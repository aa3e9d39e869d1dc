//! Metrics hooks for tagging operations
//!
//! Counts folds, seals and verification outcomes so operators can tell a
//! stream of tampered payloads apart from truncated or malformed ones.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use tss_share_filter::{FilterConfig, Metrics, TaggingService};
//!
//! let metrics = Arc::new(Metrics::new());
//! let service = TaggingService::with_metrics(FilterConfig::default(), metrics.clone())?;
//! // ... tag and verify payloads ...
//! let snapshot = metrics.snapshot();
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::domain::TagMode;
use crate::error::TagError;

/// Metrics collector for tagging operations
///
/// Thread-safe counters for monitoring tagging and verification.
#[derive(Default)]
pub struct Metrics {
    /// Identities folded into filters
    pub identities_folded: AtomicU64,
    /// Payloads sealed with the plain suffix
    pub sealed_plain: AtomicU64,
    /// Payloads sealed with the authenticated suffix
    pub sealed_authenticated: AtomicU64,
    /// Authenticated payloads whose digest checked out
    pub verifications_passed: AtomicU64,
    /// Plain suffixes read without authentication
    pub previews_passed: AtomicU64,
    /// Digest mismatches
    pub integrity_failures: AtomicU64,
    /// Payloads shorter than the required suffix
    pub truncated_payloads: AtomicU64,
    /// Suffixes that were not a valid bit-string
    pub format_rejections: AtomicU64,
    /// Cumulative fold time in nanoseconds
    pub fold_time_ns: AtomicU64,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one identity folded into a filter
    pub fn record_fold(&self, duration: Duration) {
        self.identities_folded.fetch_add(1, Ordering::Relaxed);
        self.fold_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record a sealed payload
    pub fn record_sealed(&self, mode: TagMode) {
        match mode {
            TagMode::Plain => self.sealed_plain.fetch_add(1, Ordering::Relaxed),
            TagMode::Authenticated => self.sealed_authenticated.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record a successful authenticated extraction
    pub fn record_verified(&self) {
        self.verifications_passed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a plain suffix read back without authentication
    pub fn record_previewed(&self) {
        self.previews_passed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected payload by error kind
    pub fn record_rejection(&self, error: &TagError) {
        let counter = match error {
            TagError::IntegrityMismatch { .. } => &self.integrity_failures,
            TagError::TruncatedPayload { .. } => &self.truncated_payloads,
            TagError::Format(_) => &self.format_rejections,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            identities_folded: self.identities_folded.load(Ordering::Relaxed),
            sealed_plain: self.sealed_plain.load(Ordering::Relaxed),
            sealed_authenticated: self.sealed_authenticated.load(Ordering::Relaxed),
            verifications_passed: self.verifications_passed.load(Ordering::Relaxed),
            previews_passed: self.previews_passed.load(Ordering::Relaxed),
            integrity_failures: self.integrity_failures.load(Ordering::Relaxed),
            truncated_payloads: self.truncated_payloads.load(Ordering::Relaxed),
            format_rejections: self.format_rejections.load(Ordering::Relaxed),
            avg_fold_ns: self.avg_fold_time_ns(),
        }
    }

    /// Calculate average fold time in nanoseconds
    pub fn avg_fold_time_ns(&self) -> u64 {
        let total = self.fold_time_ns.load(Ordering::Relaxed);
        let count = self.identities_folded.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Fraction of extraction attempts, verified or previewed, that were rejected
    pub fn rejection_rate(&self) -> f64 {
        let passed = self.verifications_passed.load(Ordering::Relaxed)
            + self.previews_passed.load(Ordering::Relaxed);
        let rejected = self.integrity_failures.load(Ordering::Relaxed)
            + self.truncated_payloads.load(Ordering::Relaxed)
            + self.format_rejections.load(Ordering::Relaxed);
        let total = passed + rejected;
        if total > 0 {
            rejected as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.identities_folded.store(0, Ordering::Relaxed);
        self.sealed_plain.store(0, Ordering::Relaxed);
        self.sealed_authenticated.store(0, Ordering::Relaxed);
        self.verifications_passed.store(0, Ordering::Relaxed);
        self.previews_passed.store(0, Ordering::Relaxed);
        self.integrity_failures.store(0, Ordering::Relaxed);
        self.truncated_payloads.store(0, Ordering::Relaxed);
        self.format_rejections.store(0, Ordering::Relaxed);
        self.fold_time_ns.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub identities_folded: u64,
    pub sealed_plain: u64,
    pub sealed_authenticated: u64,
    pub verifications_passed: u64,
    pub previews_passed: u64,
    pub integrity_failures: u64,
    pub truncated_payloads: u64,
    pub format_rejections: u64,
    pub avg_fold_ns: u64,
}

/// Trait for custom metrics recording implementations
///
/// Implement this trait to integrate with external metrics systems
/// like Prometheus, StatsD, or OpenTelemetry.
pub trait MetricsRecorder: Send + Sync {
    /// Record one identity folded into a filter
    fn record_fold(&self, duration: Duration);

    /// Record a sealed payload
    fn record_sealed(&self, mode: TagMode);

    /// Record a successful authenticated extraction
    fn record_verified(&self);

    /// Record a plain suffix read without authentication
    fn record_previewed(&self);

    /// Record a rejected payload
    fn record_rejection(&self, error: &TagError);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_fold(&self, _: Duration) {}
    fn record_sealed(&self, _: TagMode) {}
    fn record_verified(&self) {}
    fn record_previewed(&self) {}
    fn record_rejection(&self, _: &TagError) {}
}

impl MetricsRecorder for Metrics {
    fn record_fold(&self, duration: Duration) {
        Metrics::record_fold(self, duration);
    }

    fn record_sealed(&self, mode: TagMode) {
        Metrics::record_sealed(self, mode);
    }

    fn record_verified(&self) {
        Metrics::record_verified(self);
    }

    fn record_previewed(&self) {
        Metrics::record_previewed(self);
    }

    fn record_rejection(&self, error: &TagError) {
        Metrics::record_rejection(self, error);
    }
}
