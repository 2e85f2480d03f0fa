use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dedupe::normalize_email;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub Uuid);

impl CustomerId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A customer record. Email, first name, and last name are always present
/// (possibly empty, never absent) and stored trimmed. `normalized_email` is
/// a persisted cache of `normalize_email(email)` and is kept in sync by the
/// constructors and `set_email`; it never appears in API responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub normalized_email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Build a customer with a freshly assigned id.
    pub fn new(email: &str, first_name: &str, last_name: &str) -> Result<Self, DomainError> {
        Self::with_id(CustomerId::random(), email, first_name, last_name)
    }

    /// Build a customer under a caller-supplied id, e.g. for an update that
    /// addresses an existing record.
    pub fn with_id(
        id: CustomerId,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Self, DomainError> {
        let email = email.trim().to_string();
        let normalized_email = normalize_email(&email)?;
        Ok(Self {
            id,
            email,
            normalized_email,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            created_at: Utc::now(),
        })
    }

    /// Replace the email address, recomputing the normalized cache.
    /// The record is untouched when the new address is invalid.
    pub fn set_email(&mut self, email: &str) -> Result<(), DomainError> {
        let email = email.trim().to_string();
        self.normalized_email = normalize_email(&email)?;
        self.email = email;
        Ok(())
    }

    pub fn set_first_name(&mut self, first_name: &str) {
        self.first_name = first_name.trim().to_string();
    }

    pub fn set_last_name(&mut self, last_name: &str) {
        self.last_name = last_name.trim().to_string();
    }
}
