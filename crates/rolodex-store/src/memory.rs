//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence. It can also be told
//! to fail on purpose, to exercise the facade's error paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use rolodex_core::{Contact, ContactDraft, ContactId, PartitionKey, UserId, UserRecord, Username};

use crate::error::{Result, StoreError};
use crate::traits::{RegisterResult, Store, UniqueField, WriteResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Users indexed by lowercased username.
    users: HashMap<String, UserRecord>,

    /// Contacts per partition, indexed by id.
    partitions: BTreeMap<PartitionKey, BTreeMap<ContactId, Contact>>,

    next_user_id: i64,
    next_contact_id: i64,

    /// Injected failures.
    faults: Faults,
}

#[derive(Default)]
struct Faults {
    /// Fail the next registration at the provisioning step.
    provision: bool,
    /// Fail this many upcoming writes with `SQLITE_BUSY`.
    busy_writes: u32,
    /// Fail every read with `SQLITE_BUSY`.
    broken_reads: bool,
}

impl MemoryStoreInner {
    fn partition(&self, owner: &PartitionKey) -> Result<&BTreeMap<ContactId, Contact>> {
        self.partitions
            .get(owner)
            .ok_or_else(|| StoreError::UnknownPartition(owner.to_string()))
    }

    fn partition_mut(&mut self, owner: &PartitionKey) -> Result<&mut BTreeMap<ContactId, Contact>> {
        self.partitions
            .get_mut(owner)
            .ok_or_else(|| StoreError::UnknownPartition(owner.to_string()))
    }

    fn take_write_fault(&mut self) -> Result<()> {
        if self.faults.busy_writes > 0 {
            self.faults.busy_writes -= 1;
            return Err(StoreError::busy("injected busy write"));
        }
        Ok(())
    }

    fn check_read_fault(&self) -> Result<()> {
        if self.faults.broken_reads {
            return Err(StoreError::busy("injected broken read"));
        }
        Ok(())
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                next_user_id: 1,
                next_contact_id: 1,
                ..MemoryStoreInner::default()
            }),
        }
    }

    /// Make the next registration fail while provisioning its partition.
    pub fn fail_next_provision(&self) -> Result<()> {
        self.write()?.faults.provision = true;
        Ok(())
    }

    /// Make the next `count` writes fail with a transient `SQLITE_BUSY`.
    pub fn fail_next_writes(&self, count: u32) -> Result<()> {
        self.write()?.faults.busy_writes = count;
        Ok(())
    }

    /// Make every read fail until switched off again.
    pub fn break_reads(&self, broken: bool) -> Result<()> {
        self.write()?.faults.broken_reads = broken;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Phone then email conflict among `contacts`, skipping `exclude`.
fn find_conflict(
    contacts: &BTreeMap<ContactId, Contact>,
    draft: &ContactDraft,
    exclude: Option<ContactId>,
) -> Option<UniqueField> {
    let others = || contacts.values().filter(|c| Some(c.id) != exclude);

    if others().any(|c| c.phone == draft.phone.as_str()) {
        return Some(UniqueField::Phone);
    }

    let email = draft.email_str()?;
    others()
        .any(|c| {
            c.email
                .as_deref()
                .is_some_and(|existing| existing.eq_ignore_ascii_case(email))
        })
        .then_some(UniqueField::Email)
}

/// Newest first, ties by id descending.
fn sorted_newest_first<'a>(contacts: impl Iterator<Item = &'a Contact>) -> Vec<Contact> {
    let mut contacts: Vec<Contact> = contacts.cloned().collect();
    contacts.sort_by(|a, b| b.date_added.cmp(&a.date_added).then(b.id.cmp(&a.id)));
    contacts
}

#[async_trait]
impl Store for MemoryStore {
    async fn register_user(
        &self,
        username: &Username,
        password_hash: &str,
        now: i64,
    ) -> Result<RegisterResult> {
        let mut inner = self.write()?;
        inner.take_write_fault()?;

        let lookup = username.as_str().to_lowercase();
        let key = username.partition_key();

        if inner.users.contains_key(&lookup) || inner.partitions.contains_key(&key) {
            return Ok(RegisterResult::UsernameTaken);
        }

        // Nothing has been written yet, so failing here leaves no user behind.
        if std::mem::take(&mut inner.faults.provision) {
            return Err(StoreError::Provision {
                key: key.to_string(),
                reason: "injected provisioning failure".to_string(),
            });
        }

        let id = UserId(inner.next_user_id);
        inner.next_user_id += 1;

        inner.users.insert(
            lookup,
            UserRecord {
                id,
                username: username.as_str().to_string(),
                password_hash: password_hash.to_string(),
                partition_key: key.clone(),
                created_at: now,
            },
        );
        inner.partitions.insert(key, BTreeMap::new());

        Ok(RegisterResult::Registered(id))
    }

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let inner = self.read()?;
        inner.check_read_fault()?;
        Ok(inner.users.get(&username.to_lowercase()).cloned())
    }

    async fn has_partition(&self, owner: &PartitionKey) -> Result<bool> {
        let inner = self.read()?;
        inner.check_read_fault()?;
        Ok(inner.partitions.contains_key(owner))
    }

    async fn list_partitions(&self) -> Result<Vec<PartitionKey>> {
        let inner = self.read()?;
        inner.check_read_fault()?;
        Ok(inner.partitions.keys().cloned().collect())
    }

    async fn list_contacts(&self, owner: &PartitionKey) -> Result<Vec<Contact>> {
        let inner = self.read()?;
        inner.check_read_fault()?;
        Ok(sorted_newest_first(inner.partition(owner)?.values()))
    }

    async fn get_contact(&self, owner: &PartitionKey, id: ContactId) -> Result<Option<Contact>> {
        let inner = self.read()?;
        inner.check_read_fault()?;
        Ok(inner.partition(owner)?.get(&id).cloned())
    }

    async fn insert_contact(
        &self,
        owner: &PartitionKey,
        draft: &ContactDraft,
        date_added: i64,
    ) -> Result<WriteResult> {
        let mut inner = self.write()?;
        inner.take_write_fault()?;

        if let Some(field) = find_conflict(inner.partition(owner)?, draft, None) {
            return Ok(WriteResult::Conflict(field));
        }

        let id = ContactId(inner.next_contact_id);
        inner.next_contact_id += 1;

        inner.partition_mut(owner)?.insert(
            id,
            Contact {
                id,
                name: draft.name.as_str().to_string(),
                phone: draft.phone.as_str().to_string(),
                email: draft.email_str().map(str::to_string),
                date_added,
            },
        );

        Ok(WriteResult::Written(id))
    }

    async fn update_contact(
        &self,
        owner: &PartitionKey,
        id: ContactId,
        draft: &ContactDraft,
    ) -> Result<WriteResult> {
        let mut inner = self.write()?;
        inner.take_write_fault()?;

        let contacts = inner.partition_mut(owner)?;
        if !contacts.contains_key(&id) {
            return Ok(WriteResult::NotFound);
        }
        if let Some(field) = find_conflict(contacts, draft, Some(id)) {
            return Ok(WriteResult::Conflict(field));
        }

        if let Some(contact) = contacts.get_mut(&id) {
            contact.name = draft.name.as_str().to_string();
            contact.phone = draft.phone.as_str().to_string();
            contact.email = draft.email_str().map(str::to_string);
        }

        Ok(WriteResult::Written(id))
    }

    async fn delete_contact(&self, owner: &PartitionKey, id: ContactId) -> Result<bool> {
        let mut inner = self.write()?;
        inner.take_write_fault()?;
        Ok(inner.partition_mut(owner)?.remove(&id).is_some())
    }

    async fn search_contacts(&self, owner: &PartitionKey, term: &str) -> Result<Vec<Contact>> {
        let inner = self.read()?;
        inner.check_read_fault()?;
        Ok(sorted_newest_first(
            inner.partition(owner)?.values().filter(|c| c.matches(term)),
        ))
    }
}
