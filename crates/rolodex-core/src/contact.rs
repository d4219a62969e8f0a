//! Contact and user records.
//!
//! [`Contact`] is what the store hands back. [`ContactDraft`] is what goes in:
//! every field already validated and normalized.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::fields::{ContactName, Email, Phone};
use crate::types::{ContactId, PartitionKey, UserId};

/// A stored address-book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Identifier, unique within the owner's partition.
    pub id: ContactId,
    pub name: String,
    /// Canonical 10-digit phone number.
    pub phone: String,
    /// `None` when the contact has no email; never an empty string.
    pub email: Option<String>,
    /// Creation time (Unix ms).
    pub date_added: i64,
}

impl Contact {
    /// Case-insensitive substring match over name, phone and email.
    ///
    /// The empty term matches every contact.
    ///
    /// Only ASCII letters are case-folded, as SQLite's `LIKE` does.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.to_ascii_lowercase();
        self.name.to_ascii_lowercase().contains(&needle)
            || self.phone.contains(&needle)
            || self
                .email
                .as_deref()
                .is_some_and(|email| email.to_ascii_lowercase().contains(&needle))
    }

    /// The portable form of this contact, without its storage id.
    pub fn to_record(&self) -> ContactRecord {
        ContactRecord {
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            date_added: self.date_added,
        }
    }
}

/// Validated field values for creating or replacing a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: ContactName,
    pub phone: Phone,
    pub email: Option<Email>,
}

impl ContactDraft {
    /// Validate raw form input.
    ///
    /// Checks run name, then phone, then email, and the first failure wins.
    pub fn parse(name: &str, phone: &str, email: Option<&str>) -> Result<Self, ValidationError> {
        Ok(Self {
            name: ContactName::parse(name)?,
            phone: Phone::parse(phone)?,
            email: Email::parse_optional(email)?,
        })
    }

    pub fn email_str(&self) -> Option<&str> {
        self.email.as_ref().map(Email::as_str)
    }
}

/// Exported contact, as written by `export` and read back by `import`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub date_added: i64,
}

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    /// Encoded [`crate::PasswordHash`].
    pub password_hash: String,
    pub partition_key: PartitionKey,
    /// Registration time (Unix ms).
    pub created_at: i64,
}
