//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API for callers tagging transactions
//! - Driven Ports (outbound) - the external threshold-signature library
//!   that produces share records

pub mod inbound;
pub mod outbound;

pub use inbound::ShareTaggingApi;
pub use outbound::{JsonShare, ShareIdentity};
