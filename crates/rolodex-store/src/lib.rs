//! # Rolodex Store
//!
//! Storage abstraction for Rolodex. Provides a trait-based interface for user
//! credentials and per-owner contact partitions, with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The [`Store`] trait keeps the facade storage-agnostic. The primary
//! implementation is [`SqliteStore`], with [`MemoryStore`] for testing.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`RegisterResult`] - Result of registering a user
//! - [`WriteResult`] - Result of adding or updating a contact
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rolodex_core::{now_millis, ContactDraft, Username};
//! use rolodex_store::{SqliteStore, Store, WriteResult};
//!
//! async fn example() {
//!     let store = SqliteStore::open("rolodex.db").unwrap();
//!
//!     let alice = Username::parse("alice").unwrap();
//!     store.register_user(&alice, "$pbkdf2-sha256$...", now_millis()).await.unwrap();
//!
//!     let draft = ContactDraft::parse("Bob Jones", "9876543210", None).unwrap();
//!     let result = store
//!         .insert_contact(&alice.partition_key(), &draft, now_millis())
//!         .await
//!         .unwrap();
//!     assert!(matches!(result, WriteResult::Written(_)));
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **One shared contacts table**: partitions are rows keyed by owner, not
//!   tables, so no SQL is ever built from a username.
//! - **Atomic registration**: the user row and its partition commit together.
//! - **Constraint-backed uniqueness**: `(owner, phone)` and `(owner, email)`
//!   are unique indexes; a violation at write time is reported as a
//!   [`WriteResult::Conflict`], same as the pre-check.
//! - **Phone before email**: when both collide, the phone conflict is reported.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{RegisterResult, Store, StoreExt, UniqueField, WriteResult};
