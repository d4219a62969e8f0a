//! # Rolodex Core
//!
//! Pure primitives for Rolodex: identifiers, validated contact fields, phone
//! and email normalization, and credential hashing.
//!
//! This crate contains no I/O and no storage. Everything here is pure
//! computation over user input.
//!
//! ## Key Types
//!
//! - [`Contact`] - A stored address-book entry
//! - [`ContactDraft`] - Validated field values for an add or update
//! - [`PartitionKey`] - The sanitized username scoping one owner's contacts
//! - [`PasswordHash`] - Salted, iterated one-way credential hash
//!
//! ## Validation
//!
//! All field rules live in the [`validation`] module. The newtypes in
//! [`fields`] can only be constructed through those rules, so a
//! [`ContactDraft`] is always well-formed.

pub mod contact;
pub mod crypto;
pub mod error;
pub mod fields;
pub mod types;
pub mod validation;

pub use contact::{Contact, ContactDraft, ContactRecord, UserRecord};
pub use crypto::{PasswordHash, DEFAULT_HASH_ROUNDS};
pub use error::{CoreError, ValidationError};
pub use fields::{ContactName, Email, Password, Phone, Username};
pub use types::{now_millis, ContactId, PartitionKey, UserId};
