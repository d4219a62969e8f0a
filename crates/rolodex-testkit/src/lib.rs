//! # Rolodex Testkit
//!
//! Testing utilities for Rolodex.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: A ready-to-use Rolodex over an in-memory or temporary
//!   SQLite store, with fast password hashing
//! - **Generators**: Proptest strategies for valid usernames, names, phones
//!   and emails, plus the formatting variants a phone can be typed in
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use rolodex_testkit::generators::{phone, phone_variant};
//!
//! proptest! {
//!     #[test]
//!     fn variants_normalize(canonical in phone()) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use rolodex_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::with_user("alice").await;
//! let ids = fixture.add_samples("alice").await;
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{fast_config, sample_contacts, SampleContact, TestFixture, PASSWORD};
pub use generators::{contact_record, email, name, phone, phone_variant, username};
