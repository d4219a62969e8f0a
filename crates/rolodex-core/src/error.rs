//! Error types for Rolodex Core.

use thiserror::Error;

/// Errors from credential hashing and decoding stored core values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed password hash: {0}")]
    MalformedPasswordHash(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Field validation failures.
///
/// The display strings are user-facing and mirror the wording shown by the
/// contact manager forms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Username must be at least {min} characters long")]
    UsernameTooShort { min: usize },

    #[error("Username can only contain letters, numbers, and underscores")]
    UsernameInvalidCharacters,

    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("Name must be between {min} and {max} characters long")]
    NameLength { min: usize, max: usize },

    #[error("Name can only contain letters, spaces, apostrophes and hyphens")]
    NameInvalidCharacters,

    #[error("Name cannot have consecutive spaces, apostrophes or hyphens")]
    NameConsecutiveSpecials,

    #[error("Name cannot start or end with a space, apostrophe or hyphen")]
    NameEdgeSpecial,

    #[error("Name must contain at least {min} letters")]
    NameTooFewLetters { min: usize },

    #[error("Phone number cannot be empty")]
    EmptyPhone,

    #[error("Please enter a valid 10-digit phone number (should start with 6-9)")]
    InvalidPhone,

    #[error("Please enter a valid email address")]
    InvalidEmail,
}
