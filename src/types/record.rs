//! Record identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of the CRM record a token is scoped to.
///
/// The only rule is non-emptiness. Whether it names a deal, a contact or
/// something else is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

/// Returned when constructing a [`RecordId`] from an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("record identifier must not be empty")]
pub struct EmptyRecordId;

impl RecordId {
    /// Create a record identifier, rejecting the empty string.
    pub fn new(id: impl Into<String>) -> Result<Self, EmptyRecordId> {
        let id = id.into();
        if id.is_empty() {
            Err(EmptyRecordId)
        } else {
            Ok(Self(id))
        }
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = EmptyRecordId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl PartialEq<str> for RecordId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
