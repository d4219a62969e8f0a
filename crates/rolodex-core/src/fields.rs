//! Validated field newtypes.
//!
//! Each type can only be built through the rules in [`crate::validation`],
//! so holding one is proof the value passed them.

use std::fmt;

use crate::error::ValidationError;
use crate::types::PartitionKey;
use crate::validation::{
    check_name, check_password, check_username, normalize_email, normalize_phone,
};

/// A registered (or registrable) username.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate a username.
    pub fn parse(username: &str) -> Result<Self, ValidationError> {
        check_username(username)?;
        Ok(Self(username.to_string()))
    }

    /// Get the username.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The contact partition owned by this user.
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::from_username(&self.0)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A plaintext password on its way to being hashed.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Validate a password.
    pub fn parse(password: &str) -> Result<Self, ValidationError> {
        check_password(password)?;
        Ok(Self(password.to_string()))
    }

    /// Get the plaintext.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// A contact's display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContactName(String);

impl ContactName {
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        check_name(name)?;
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A phone number in canonical 10-digit form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Phone(String);

impl Phone {
    /// Normalize and validate raw phone input.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        normalize_phone(input).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A trimmed, syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Parse optional email input. Blank input yields `Ok(None)`.
    pub fn parse_optional(input: Option<&str>) -> Result<Option<Self>, ValidationError> {
        Ok(normalize_email(input)?.map(Self))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
