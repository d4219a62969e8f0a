//! # Rolodex
//!
//! Personal contact books behind a credential gate.
//!
//! ## Overview
//!
//! Rolodex keeps a credential store of registered users and, for each user,
//! an isolated contact book:
//!
//! - **Users**: Unique, case-insensitive usernames with salted password hashes
//! - **Partitions**: One contact book per user, created atomically with the user
//! - **Contacts**: Name, normalized 10-digit phone, optional email, date added
//! - **Uniqueness**: Phone and email are unique within one owner's book only
//!
//! ## Key Concepts
//!
//! - **Owner**: The username whose partition an operation touches. Contact
//!   operations never cross owners.
//! - **Partition key**: The lowercased, space-free storage name derived from
//!   a username.
//! - **Normalization**: Phones are stored as bare 10-digit numbers, so
//!   `"+91 98765-43210"` and `"9876543210"` are the same phone.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rolodex::{Rolodex, RolodexConfig};
//!
//! async fn example() -> rolodex::Result<()> {
//!     let rolodex = Rolodex::open(RolodexConfig::default().with_database("rolodex.db"))?;
//!
//!     rolodex.register("alice", "secret1").await?;
//!     rolodex.login("alice", "secret1").await?;
//!
//!     let id = rolodex
//!         .add_contact("alice", "Bob Jones", "+91 98765 43210", Some("bob@example.com"))
//!         .await?;
//!
//!     for contact in rolodex.search_contacts("alice", "jones").await? {
//!         println!("{} {} {}", contact.id, contact.name, contact.phone);
//!     }
//!
//!     rolodex.delete_contact("alice", id).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `rolodex::core` - Field types, validation and password hashing
//! - `rolodex::store` - Storage abstraction, SQLite and in-memory stores

pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod outcome;
pub mod service;
pub mod throttle;

// Re-export component crates
pub use rolodex_core as core;
pub use rolodex_store as store;

// Re-export main types for convenience
pub use config::RolodexConfig;
pub use error::{Result, RolodexError, GENERIC_FAILURE};
pub use export::{ImportRejection, ImportReport};
pub use outcome::Outcome;
pub use service::Rolodex;
pub use throttle::LoginThrottle;

// Re-export commonly used core types
pub use rolodex_core::{Contact, ContactId, ContactRecord, PartitionKey, UserId};
