//! Outbound Ports (Driven Ports)
//!
//! Share records come from an external threshold-RSA library. This crate
//! never looks inside them: a record only has to produce the opaque string
//! that gets folded into a filter.

use serde::Serialize;

use crate::error::TagError;

/// Source of the opaque identity string for one signing share
pub trait ShareIdentity {
    /// Serialized identity folded into the filter
    fn identity(&self) -> Result<String, TagError>;
}

impl ShareIdentity for str {
    fn identity(&self) -> Result<String, TagError> {
        Ok(self.to_owned())
    }
}

impl ShareIdentity for String {
    fn identity(&self) -> Result<String, TagError> {
        Ok(self.clone())
    }
}

impl<T: ShareIdentity + ?Sized> ShareIdentity for &T {
    fn identity(&self) -> Result<String, TagError> {
        (**self).identity()
    }
}

/// Any serde-serializable share record, identified by its compact JSON form
///
/// Field order follows the record's `Serialize` impl, so the same record
/// always yields the same identity.
#[derive(Clone, Copy, Debug)]
pub struct JsonShare<'a, T: Serialize>(pub &'a T);

impl<T: Serialize> ShareIdentity for JsonShare<'_, T> {
    fn identity(&self) -> Result<String, TagError> {
        serde_json::to_string(self.0).map_err(|e| TagError::IdentityEncoding(e.to_string()))
    }
}
