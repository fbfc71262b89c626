//! Contact domain model.
//!
//! # Responsibility
//! - Define the canonical prospect record collected from scanned codes.
//! - Own field-level validation shared by store writes and reads.
//!
//! # Invariants
//! - `id` is stable and never reused for another contact.
//! - `created_at` is fixed at construction and never rewritten.
//! - `is_contacted` starts as `false`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a contact record.
pub type ContactId = Uuid;

/// Field-level validation failures for contact records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    /// Contact ids must never be the nil UUID.
    NilId,
    /// Name is empty after trimming.
    EmptyName,
    /// Email is empty after trimming.
    EmptyEmail,
    /// Email was rejected by the configured email policy.
    InvalidEmail(String),
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "contact id must not be nil"),
            Self::EmptyName => write!(f, "contact name must not be empty"),
            Self::EmptyEmail => write!(f, "contact email must not be empty"),
            Self::InvalidEmail(policy) => {
                write!(f, "contact email rejected by `{policy}` email policy")
            }
        }
    }
}

impl Error for ContactValidationError {}

/// Canonical prospect record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Stable global ID used for selection and deduplication.
    pub id: ContactId,
    /// Display name, non-empty.
    pub name: String,
    /// Email address; only checked for emptiness unless a stricter policy is set.
    pub email: String,
    /// Follow-up flag flipped by contacted toggles.
    pub is_contacted: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Contact {
    /// Creates a new uncontacted record stamped with the current time.
    ///
    /// Name and email are trimmed; validation is left to [`Contact::validate`].
    pub fn new(name: impl AsRef<str>, email: impl AsRef<str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.as_ref().trim().to_string(),
            email: email.as_ref().trim().to_string(),
            is_contacted: false,
            created_at: now_epoch_ms(),
        }
    }

    /// Checks field invariants without touching storage.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if self.id.is_nil() {
            return Err(ContactValidationError::NilId);
        }
        validate_fields(&self.name, &self.email)
    }
}

/// Rejects empty (after trim) names and emails.
pub fn validate_fields(name: &str, email: &str) -> Result<(), ContactValidationError> {
    if name.trim().is_empty() {
        return Err(ContactValidationError::EmptyName);
    }
    if email.trim().is_empty() {
        return Err(ContactValidationError::EmptyEmail);
    }
    Ok(())
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
