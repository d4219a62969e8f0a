//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::Path;
use std::time::Duration;

use rolodex::{Rolodex, RolodexConfig};
use rolodex_core::ContactId;
use rolodex_store::{MemoryStore, SqliteStore, Store};
use tempfile::TempDir;

/// Password every fixture user is registered with.
pub const PASSWORD: &str = "secret1";

/// Configuration with cheap hashing and no retry pauses.
pub fn fast_config() -> RolodexConfig {
    RolodexConfig {
        hash_rounds: 8,
        retry_backoff: Duration::ZERO,
        ..RolodexConfig::default()
    }
}

/// A contact as typed into the add form.
#[derive(Debug, Clone, Copy)]
pub struct SampleContact {
    pub name: &'static str,
    pub phone: &'static str,
    pub email: Option<&'static str>,
}

/// A small book with mixed phone formatting and one contact without email.
pub fn sample_contacts() -> Vec<SampleContact> {
    vec![
        SampleContact {
            name: "Alice Smith",
            phone: "+91 98765 43210",
            email: Some("alice@example.com"),
        },
        SampleContact {
            name: "Bob Jones",
            phone: "8765432109",
            email: None,
        },
        SampleContact {
            name: "Carol D'Souza",
            phone: "(765) 432-1098",
            email: Some("carol@example.org"),
        },
    ]
}

/// A Rolodex over a fresh store.
pub struct TestFixture<S: Store = MemoryStore> {
    pub rolodex: Rolodex<S>,
    /// Keeps the SQLite file alive.
    dir: Option<TempDir>,
}

impl TestFixture<MemoryStore> {
    /// In-memory store, no users.
    pub fn new() -> Self {
        Self {
            rolodex: Rolodex::new(MemoryStore::new(), fast_config()),
            dir: None,
        }
    }

    /// In-memory store with one registered user.
    pub async fn with_user(username: &str) -> Self {
        let fixture = Self::new();
        fixture.register(username).await;
        fixture
    }

    /// The in-memory store, for fault injection.
    pub fn store(&self) -> &MemoryStore {
        self.rolodex.store()
    }
}

impl Default for TestFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture<SqliteStore> {
    /// SQLite store in a temporary directory.
    pub fn sqlite() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = fast_config().with_database(dir.path().join("rolodex.db"));
        let rolodex = Rolodex::open(config).expect("open sqlite rolodex");
        Self {
            rolodex,
            dir: Some(dir),
        }
    }

    /// Path of the database file.
    pub fn database_path(&self) -> Option<&Path> {
        self.rolodex.config().database_path.as_deref()
    }

    /// Reopen the same database file with a fresh Rolodex.
    pub fn reopen(self) -> Self {
        let config = self.rolodex.config().clone();
        drop(self.rolodex);
        Self {
            rolodex: Rolodex::open(config).expect("reopen sqlite rolodex"),
            dir: self.dir,
        }
    }
}

impl<S: Store> TestFixture<S> {
    /// Register `username` with [`PASSWORD`].
    pub async fn register(&self, username: &str) {
        self.rolodex
            .register(username, PASSWORD)
            .await
            .expect("register fixture user");
    }

    /// Add [`sample_contacts`] to `owner`'s book, returning their ids in order.
    pub async fn add_samples(&self, owner: &str) -> Vec<ContactId> {
        let mut ids = Vec::new();
        for sample in sample_contacts() {
            let id = self
                .rolodex
                .add_contact(owner, sample.name, sample.phone, sample.email)
                .await
                .expect("add sample contact");
            ids.push(id);
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_with_samples() {
        let fixture = TestFixture::with_user("alice").await;
        let ids = fixture.add_samples("alice").await;
        assert_eq!(ids.len(), 3);

        let contacts = fixture.rolodex.list_contacts("alice").await.unwrap();
        assert_eq!(contacts.len(), 3);
        assert!(contacts.iter().any(|c| c.phone == "9876543210"));
        assert!(contacts.iter().any(|c| c.phone == "7654321098"));
    }

    #[tokio::test]
    async fn test_sqlite_fixture_survives_reopen() {
        let fixture = TestFixture::sqlite();
        assert!(fixture.database_path().is_some());
        fixture.register("alice").await;
        fixture.add_samples("alice").await;

        let fixture = fixture.reopen();
        assert!(fixture.rolodex.authenticate("alice", PASSWORD).await);
        assert_eq!(fixture.rolodex.list_contacts("alice").await.unwrap().len(), 3);
    }
}
