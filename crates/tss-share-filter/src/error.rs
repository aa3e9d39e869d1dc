//! Error types for share filter tagging

use thiserror::Error;

use crate::domain::TagMode;

/// Errors that can occur while tagging or verifying a transaction payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("Malformed filter encoding: {0}")]
    Format(#[from] FormatError),

    #[error("Payload truncated: {actual} bytes < {required} required")]
    TruncatedPayload { actual: usize, required: usize },

    #[error("Integrity check failed: filter hash mismatch (expected {expected}, found {found})")]
    IntegrityMismatch { expected: String, found: String },

    #[error("Invalid filter parameters: {0}")]
    InvalidParameters(String),

    #[error("Incompatible filters: width {left} / {right}, rounds {left_rounds} / {right_rounds}")]
    IncompatibleFilters {
        left: usize,
        right: usize,
        left_rounds: usize,
        right_rounds: usize,
    },

    #[error("Share identity encoding failed: {0}")]
    IdentityEncoding(String),

    #[error("Share registry full: capacity {capacity}")]
    FilterFull { capacity: usize },

    #[error("Transaction already sealed ({mode:?}); its filter is immutable")]
    AlreadySealed { mode: TagMode },
}

/// Errors from parsing a rendered bit-string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("expected {expected} bits, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("invalid byte 0x{byte:02x} at position {position}")]
    InvalidCharacter { position: usize, byte: u8 },
}

impl TagError {
    /// True for malformed bit-string failures
    pub fn is_format(&self) -> bool {
        matches!(self, TagError::Format(_))
    }
}
