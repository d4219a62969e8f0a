//! Flag-and-message results for the presentation layer.

use serde::Serialize;

use crate::error::Result;

pub const REGISTERED: &str = "User registered successfully";
pub const CONTACT_ADDED: &str = "Contact added successfully";
pub const CONTACT_UPDATED: &str = "Contact updated successfully";
pub const CONTACT_DELETED: &str = "Contact deleted successfully";

/// A success flag plus a message fit to show the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Collapse an operation result. Storage details never reach the message.
    pub fn from_result<T>(result: &Result<T>, success: &str) -> Self {
        match result {
            Ok(_) => Self::ok(success),
            Err(e) => Self::failed(e.user_message()),
        }
    }

    /// Collapse the result of a contact update, using the edit wording for
    /// duplicates.
    pub fn from_update(result: &Result<()>) -> Self {
        match result {
            Ok(()) => Self::ok(CONTACT_UPDATED),
            Err(e) => Self::failed(e.update_message()),
        }
    }
}
