//! Owner-keyed contact list cache.
//!
//! Holds the last `list_contacts` result per owner. Any write to an owner's
//! partition must call [`ContactCache::invalidate`] for that owner after it
//! commits.
//!
//! Each owner also has a generation that `invalidate` bumps. A reader takes
//! the generation before reading the store and hands it back to
//! [`ContactCache::put`]; if a write was invalidated in between, the list it
//! read may predate that write and is not cached.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rolodex_core::{Contact, PartitionKey};

#[derive(Debug, Default)]
struct Entries {
    lists: HashMap<PartitionKey, Arc<Vec<Contact>>>,
    generations: HashMap<PartitionKey, u64>,
}

/// Cached contact lists, one per owner.
#[derive(Debug, Default)]
pub struct ContactCache {
    entries: RwLock<Entries>,
}

impl ContactCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, owner: &PartitionKey) -> Option<Arc<Vec<Contact>>> {
        self.read().lists.get(owner).cloned()
    }

    /// Current generation for `owner`. Take it before reading the store.
    pub fn generation(&self, owner: &PartitionKey) -> u64 {
        self.read().generations.get(owner).copied().unwrap_or(0)
    }

    /// Cache `contacts` if `owner` has not been invalidated since
    /// `generation` was taken. Returns whether the list was stored.
    pub fn put(&self, owner: PartitionKey, generation: u64, contacts: Vec<Contact>) -> bool {
        let mut entries = self.write();
        let current = entries.generations.get(&owner).copied().unwrap_or(0);
        if current != generation {
            return false;
        }
        entries.lists.insert(owner, Arc::new(contacts));
        true
    }

    pub fn invalidate(&self, owner: &PartitionKey) {
        let mut entries = self.write();
        *entries.generations.entry(owner.clone()).or_insert(0) += 1;
        if entries.lists.remove(owner).is_some() {
            tracing::debug!(%owner, "contact cache invalidated");
        }
    }
}
