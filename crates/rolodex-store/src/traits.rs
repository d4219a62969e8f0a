//! Store trait: the abstract interface for credential and contact persistence.
//!
//! This trait keeps the facade storage-agnostic. Implementations include
//! SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use rolodex_core::{Contact, ContactDraft, ContactId, PartitionKey, UserId, UserRecord, Username};

use crate::error::Result;

/// Which uniqueness constraint a write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Phone,
    Email,
}

/// Result of registering a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterResult {
    /// User stored and partition provisioned.
    Registered(UserId),
    /// Username, or the partition key derived from it, is already taken.
    UsernameTaken,
}

/// Result of inserting or updating a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// The write was applied to this contact.
    Written(ContactId),
    /// Another contact of the same owner already holds this value.
    Conflict(UniqueField),
    /// The contact does not exist under this owner (updates only).
    NotFound,
}

/// The Store trait: async interface for users and contact partitions.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Atomic registration**: `register_user` stores the user and provisions
///   the partition in one unit. Either both exist afterwards or neither does.
/// - **Owner scoping**: every contact method takes the owner's
///   [`PartitionKey`] and never sees another owner's rows. Calls against a
///   key with no partition fail with `StoreError::UnknownPartition`.
/// - **Check order**: inserts and updates check phone uniqueness before
///   email uniqueness. Updates exclude the contact being replaced.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Credential Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a user and provision an empty contact partition.
    ///
    /// Username comparison is case-insensitive.
    async fn register_user(
        &self,
        username: &Username,
        password_hash: &str,
        now: i64,
    ) -> Result<RegisterResult>;

    /// Look up a user by username (case-insensitive).
    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Check whether a partition exists.
    async fn has_partition(&self, owner: &PartitionKey) -> Result<bool>;

    /// List all partition keys, sorted.
    async fn list_partitions(&self) -> Result<Vec<PartitionKey>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Contact Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// All contacts of an owner, newest first (ties by id, highest first).
    async fn list_contacts(&self, owner: &PartitionKey) -> Result<Vec<Contact>>;

    /// Get one contact.
    async fn get_contact(&self, owner: &PartitionKey, id: ContactId) -> Result<Option<Contact>>;

    /// Insert a contact with the given creation time.
    ///
    /// # Returns
    /// - `Written(id)` with the new identifier.
    /// - `Conflict(Phone)` if the phone is taken, else `Conflict(Email)` if
    ///   the (present) email is taken.
    async fn insert_contact(
        &self,
        owner: &PartitionKey,
        draft: &ContactDraft,
        date_added: i64,
    ) -> Result<WriteResult>;

    /// Replace name, phone and email of an existing contact.
    ///
    /// `date_added` is left unchanged.
    async fn update_contact(
        &self,
        owner: &PartitionKey,
        id: ContactId,
        draft: &ContactDraft,
    ) -> Result<WriteResult>;

    /// Delete a contact. Returns `false` if it did not exist.
    async fn delete_contact(&self, owner: &PartitionKey, id: ContactId) -> Result<bool>;

    /// Case-insensitive substring search over name, phone and email.
    ///
    /// Ordered like [`Store::list_contacts`]. The empty term matches all.
    async fn search_contacts(&self, owner: &PartitionKey, term: &str) -> Result<Vec<Contact>>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Insert several contacts, one atomic insert each.
    ///
    /// A conflict on one entry does not stop the rest. Storage faults do.
    fn insert_contacts(
        &self,
        owner: &PartitionKey,
        entries: &[(ContactDraft, i64)],
    ) -> impl std::future::Future<Output = Result<Vec<WriteResult>>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn insert_contacts(
        &self,
        owner: &PartitionKey,
        entries: &[(ContactDraft, i64)],
    ) -> Result<Vec<WriteResult>> {
        let mut results = Vec::with_capacity(entries.len());
        for (draft, date_added) in entries {
            results.push(self.insert_contact(owner, draft, *date_added).await?);
        }
        Ok(results)
    }
}
