//! The Rolodex facade: the operation contract the presentation layer calls.
//!
//! Brings together the credential gate, per-owner contact partitions, login
//! throttling and the contact cache. Every input is re-validated here before
//! it reaches the store.

use std::future::Future;
use std::sync::Arc;

use rolodex_core::{
    now_millis, Contact, ContactDraft, ContactId, ContactRecord, PartitionKey, Password,
    PasswordHash, UserId, Username,
};
use rolodex_store::{
    RegisterResult, SqliteStore, Store, StoreError, StoreExt, UniqueField, WriteResult,
};

use crate::cache::ContactCache;
use crate::config::RolodexConfig;
use crate::error::{Result, RolodexError};
use crate::export::{self, ImportRejection, ImportReport};
use crate::throttle::LoginThrottle;

/// Per-user contact books behind a credential gate.
///
/// Owners are identified by username. Every contact operation is scoped to
/// the owner's partition; nothing here can reach another owner's contacts.
pub struct Rolodex<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: RolodexConfig,
    /// Failed-login bookkeeping.
    throttle: LoginThrottle,
    /// `None` when caching is disabled.
    cache: Option<ContactCache>,
    /// Verified against when the username is unknown, so both failure
    /// paths do the same work.
    decoy: Option<PasswordHash>,
}

impl Rolodex<SqliteStore> {
    /// Open a SQLite-backed instance as described by `config`.
    pub fn open(config: RolodexConfig) -> Result<Self> {
        let store = match &config.database_path {
            Some(path) => SqliteStore::open(path)?,
            None => SqliteStore::open_memory()?,
        };
        Ok(Self::new(store, config))
    }
}

impl<S: Store> Rolodex<S> {
    /// Create a new instance over `store`.
    pub fn new(store: S, config: RolodexConfig) -> Self {
        Self {
            store: Arc::new(store),
            throttle: LoginThrottle::with_capacity(
                config.max_login_attempts,
                config.lockout,
                config.max_tracked_logins,
            ),
            cache: config.cache_contacts.then(ContactCache::new),
            decoy: PasswordHash::generate("rolodex-decoy-password", config.hash_rounds).ok(),
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RolodexConfig {
        &self.config
    }

    pub fn throttle(&self) -> &LoginThrottle {
        &self.throttle
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Credential Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a user and provision their empty contact partition.
    ///
    /// Both happen in one store transaction: on any failure neither the user
    /// nor the partition exists.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserId> {
        let username = Username::parse(username)?;
        let password = Password::parse(password)?;
        let hash = PasswordHash::generate(password.expose(), self.config.hash_rounds)?.encode();

        let result = self
            .with_retries(|| self.store.register_user(&username, &hash, now_millis()))
            .await
            .map_err(|e| {
                if matches!(e, StoreError::Provision { .. }) {
                    tracing::error!(%username, error = %e, "partition provisioning failed");
                }
                RolodexError::from(e)
            })?;

        match result {
            RegisterResult::Registered(id) => {
                tracing::info!(%username, user_id = %id, "user registered");
                Ok(id)
            }
            RegisterResult::UsernameTaken => Err(RolodexError::DuplicateUsername),
        }
    }

    /// Whether the credentials match a registered user.
    ///
    /// Unknown user, wrong password and storage faults all give `false`.
    /// Faults are logged.
    pub async fn authenticate(&self, username: &str, password: &str) -> bool {
        self.verify_credentials(username, password).await.is_ok()
    }

    /// Log in through the throttle.
    ///
    /// Fails with `LockedOut` while the username is locked, otherwise with
    /// `InvalidCredentials` for any failed check.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        // Names that could never be registered are not tracked.
        if Username::parse(username).is_err() {
            return Err(RolodexError::InvalidCredentials);
        }

        if let Err(retry_after) = self.throttle.check(username) {
            tracing::warn!(%username, ?retry_after, "login rejected: locked out");
            return Err(RolodexError::LockedOut { retry_after });
        }

        match self.verify_credentials(username, password).await {
            Ok(()) => {
                self.throttle.record_success(username);
                Ok(())
            }
            Err(RolodexError::StorageFault(_)) => Err(RolodexError::InvalidCredentials),
            Err(_) => {
                if let Some(lockout) = self.throttle.record_failure(username) {
                    tracing::warn!(%username, ?lockout, "too many failed logins; locking");
                } else {
                    tracing::warn!(
                        %username,
                        remaining = self.throttle.remaining_attempts(username),
                        "login failed"
                    );
                }
                Err(RolodexError::InvalidCredentials)
            }
        }
    }

    /// `Ok` on a match, `InvalidCredentials` on a mismatch, `StorageFault`
    /// when the answer is unknown.
    async fn verify_credentials(&self, username: &str, password: &str) -> Result<()> {
        if Username::parse(username).is_err() {
            return Err(RolodexError::InvalidCredentials);
        }

        let user = match self.store.get_user(username).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(%username, error = %e, "credential lookup failed");
                return Err(RolodexError::StorageFault(e));
            }
        };

        let Some(user) = user else {
            if let Some(decoy) = &self.decoy {
                let _ = decoy.verify(password);
            }
            return Err(RolodexError::InvalidCredentials);
        };

        match PasswordHash::parse(&user.password_hash) {
            Ok(hash) if hash.verify(password) => Ok(()),
            Ok(_) => Err(RolodexError::InvalidCredentials),
            Err(e) => {
                tracing::error!(%username, error = %e, "stored credential is unreadable");
                Err(RolodexError::StorageFault(StoreError::InvalidData(
                    e.to_string(),
                )))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Contact Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// All of the owner's contacts, newest first.
    pub async fn list_contacts(&self, owner: &str) -> Result<Vec<Contact>> {
        let key = owner_key(owner)?;

        let Some(cache) = &self.cache else {
            return Ok(self.store.list_contacts(&key).await?);
        };

        if let Some(cached) = cache.get(&key) {
            tracing::debug!(%key, "contact cache hit");
            return Ok(cached.as_ref().clone());
        }

        let generation = cache.generation(&key);
        let contacts = self.store.list_contacts(&key).await?;
        if !cache.put(key.clone(), generation, contacts.clone()) {
            tracing::debug!(%key, "contacts changed during read; not cached");
        }
        Ok(contacts)
    }

    /// Add a contact. Returns its new id.
    ///
    /// Phone uniqueness is checked before email uniqueness.
    pub async fn add_contact(
        &self,
        owner: &str,
        name: &str,
        phone: &str,
        email: Option<&str>,
    ) -> Result<ContactId> {
        let key = owner_key(owner)?;
        let draft = ContactDraft::parse(name, phone, email)?;

        let result = self
            .with_retries(|| self.store.insert_contact(&key, &draft, now_millis()))
            .await?;

        let id = written(result)?;
        self.invalidate(&key);
        tracing::info!(%key, contact_id = %id, "contact added");
        Ok(id)
    }

    /// Replace a contact's name, phone and email.
    pub async fn update_contact(
        &self,
        owner: &str,
        id: ContactId,
        name: &str,
        phone: &str,
        email: Option<&str>,
    ) -> Result<()> {
        let key = owner_key(owner)?;
        let draft = ContactDraft::parse(name, phone, email)?;

        let result = self
            .with_retries(|| self.store.update_contact(&key, id, &draft))
            .await?;

        written(result)?;
        self.invalidate(&key);
        tracing::info!(%key, contact_id = %id, "contact updated");
        Ok(())
    }

    /// Delete a contact.
    ///
    /// Deleting an id the owner does not have is `NotFound`.
    pub async fn delete_contact(&self, owner: &str, id: ContactId) -> Result<()> {
        let key = owner_key(owner)?;

        let removed = self
            .with_retries(|| self.store.delete_contact(&key, id))
            .await?;

        if !removed {
            return Err(RolodexError::NotFound);
        }
        self.invalidate(&key);
        tracing::info!(%key, contact_id = %id, "contact deleted");
        Ok(())
    }

    /// Case-insensitive substring search over name, phone and email.
    ///
    /// An empty term matches every contact.
    pub async fn search_contacts(&self, owner: &str, term: &str) -> Result<Vec<Contact>> {
        let key = owner_key(owner)?;
        Ok(self.store.search_contacts(&key, term).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export / Import
    // ─────────────────────────────────────────────────────────────────────────

    /// The owner's contacts as portable records, newest first.
    pub async fn export_contacts(&self, owner: &str) -> Result<Vec<ContactRecord>> {
        Ok(self
            .list_contacts(owner)
            .await?
            .iter()
            .map(Contact::to_record)
            .collect())
    }

    /// The owner's contacts as pretty-printed JSON.
    pub async fn export_json(&self, owner: &str) -> Result<String> {
        export::to_json(&self.export_contacts(owner).await?)
    }

    /// Add exported records to the owner's book.
    ///
    /// Invalid and duplicate records are reported and skipped; a storage
    /// fault aborts the import. Inserts are not retried, since a retried
    /// batch would collide with its own earlier inserts.
    pub async fn import_contacts(
        &self,
        owner: &str,
        records: &[ContactRecord],
    ) -> Result<ImportReport> {
        let key = owner_key(owner)?;
        let mut report = ImportReport::default();

        let mut entries = Vec::with_capacity(records.len());
        let mut positions = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            match ContactDraft::parse(&record.name, &record.phone, record.email.as_deref()) {
                Ok(draft) => {
                    entries.push((draft, record.date_added));
                    positions.push(index);
                }
                Err(e) => report.rejected.push(ImportRejection {
                    index,
                    reason: e.into(),
                }),
            }
        }

        let results = self.store.insert_contacts(&key, &entries).await;
        // Some records may have landed before a fault.
        self.invalidate(&key);

        for (index, result) in positions.into_iter().zip(results?) {
            match written(result) {
                Ok(id) => report.imported.push(id),
                Err(reason) => report.rejected.push(ImportRejection { index, reason }),
            }
        }
        report.rejected.sort_by_key(|r| r.index);

        tracing::info!(
            %key,
            imported = report.imported.len(),
            rejected = report.rejected.len(),
            "contacts imported"
        );
        Ok(report)
    }

    /// Import records from JSON produced by [`Rolodex::export_json`].
    pub async fn import_json(&self, owner: &str, json: &str) -> Result<ImportReport> {
        let records = export::from_json(json)?;
        self.import_contacts(owner, &records).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn invalidate(&self, key: &PartitionKey) {
        if let Some(cache) = &self.cache {
            cache.invalidate(key);
        }
    }

    /// Run a store write, retrying transient faults.
    async fn with_retries<T, F, Fut>(&self, mut op: F) -> std::result::Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(e) if e.is_transient() && attempt < self.config.transient_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %e, "transient storage fault; retrying");
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                other => return other,
            }
        }
    }
}

/// Validate an owner identity and derive its partition key.
fn owner_key(owner: &str) -> Result<PartitionKey> {
    Ok(Username::parse(owner)?.partition_key())
}

fn written(result: WriteResult) -> Result<ContactId> {
    match result {
        WriteResult::Written(id) => Ok(id),
        WriteResult::Conflict(UniqueField::Phone) => Err(RolodexError::DuplicatePhone),
        WriteResult::Conflict(UniqueField::Email) => Err(RolodexError::DuplicateEmail),
        WriteResult::NotFound => Err(RolodexError::NotFound),
    }
}
