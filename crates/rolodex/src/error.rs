//! Error types for the Rolodex facade.

use std::time::Duration;

use rolodex_core::{CoreError, ValidationError};
use rolodex_store::StoreError;
use thiserror::Error;

/// Shown to callers in place of storage internals.
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again";

/// Errors that can occur during Rolodex operations.
#[derive(Debug, Error)]
pub enum RolodexError {
    /// Username (or its partition key) is already registered.
    #[error("Username already exists")]
    DuplicateUsername,

    /// Another contact of this owner has the phone number.
    #[error("Phone number already exists in your contacts")]
    DuplicatePhone,

    /// Another contact of this owner has the email address.
    #[error("Email address already exists in your contacts")]
    DuplicateEmail,

    /// The contact does not exist under this owner.
    #[error("Contact not found")]
    NotFound,

    /// Input failed a field rule.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Storage failed (connection, query, lock).
    #[error("storage fault: {0}")]
    StorageFault(#[source] StoreError),

    /// The user's contact partition could not be created; the registration
    /// was rolled back.
    #[error("Error creating contact list for {0}")]
    PartitionProvisionFailed(String),

    /// The owner has no contact partition.
    #[error("No contact list exists for {0}")]
    UnknownOwner(String),

    /// Login failed. Deliberately does not say why.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Too many failed logins for this username.
    #[error("Too many failed attempts. Try again in {} seconds", whole_seconds(.retry_after))]
    LockedOut { retry_after: Duration },

    /// Export or import data could not be (de)serialized.
    #[error("malformed contact data: {0}")]
    Format(#[from] serde_json::Error),

    /// A password could not be hashed.
    #[error("credential hashing failed: {0}")]
    Credential(#[from] CoreError),
}

/// Seconds left, rounded up, never below one.
fn whole_seconds(d: &Duration) -> u64 {
    (d.as_secs() + u64::from(d.subsec_nanos() > 0)).max(1)
}

impl From<StoreError> for RolodexError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UnknownPartition(owner) => RolodexError::UnknownOwner(owner),
            StoreError::Provision { key, .. } => RolodexError::PartitionProvisionFailed(key),
            other => RolodexError::StorageFault(other),
        }
    }
}

impl RolodexError {
    /// The message to show an end user.
    ///
    /// Storage faults collapse to [`GENERIC_FAILURE`]; everything else uses
    /// its display text.
    pub fn user_message(&self) -> String {
        match self {
            RolodexError::StorageFault(_) | RolodexError::Credential(_) => {
                GENERIC_FAILURE.to_string()
            }
            other => other.to_string(),
        }
    }

    /// Like [`RolodexError::user_message`], worded for an edit of an
    /// existing contact.
    pub fn update_message(&self) -> String {
        match self {
            RolodexError::DuplicatePhone => {
                "Phone number already exists for another contact".to_string()
            }
            RolodexError::DuplicateEmail => "Email already exists for another contact".to_string(),
            other => other.user_message(),
        }
    }
}

/// Result type for Rolodex operations.
pub type Result<T> = std::result::Result<T, RolodexError>;
