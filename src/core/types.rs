//! Core identifier types for the scheduler.
//!
//! These types provide type-safe identifiers for recurring-transaction
//! records and outbound submissions.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique code of a recurring-transaction record.
///
/// Assigned when the record is created and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionCode(String);

/// Unique identifier for a single outbound payment submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(Uuid);

impl TransactionCode {
    /// Create a new TransactionCode from a string.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generate a fresh random code for a newly created record.
    ///
    /// Ten hex characters, matching the width the gateway uses elsewhere.
    pub fn generate() -> Self {
        let mut buf = Uuid::encode_buffer();
        let simple = Uuid::new_v4().simple().encode_lower(&mut buf);
        Self(simple[..10].to_string())
    }

    /// Get the underlying string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransactionCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TransactionCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl SubmissionId {
    /// Generate a new random SubmissionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a SubmissionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
