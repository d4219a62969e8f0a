//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for Rolodex. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior};

use rolodex_core::{Contact, ContactDraft, ContactId, PartitionKey, UserId, UserRecord, Username};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{RegisterResult, Store, UniqueField, WriteResult};

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CONTACT_COLUMNS: &str = "id, name, phone, email, date_added";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime, and every write runs in an
/// `IMMEDIATE` transaction so check-then-write is atomic.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Blocking(e.to_string()))?
    }
}

// Helper to convert a row to Contact
fn row_to_contact(row: &rusqlite::Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: ContactId(row.get("id")?),
        name: row.get("name")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        date_added: row.get("date_added")?,
    })
}

// Helper to convert a row to UserRecord
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    let partition_key: String = row.get("partition_key")?;
    Ok(UserRecord {
        id: UserId(row.get("id")?),
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        partition_key: PartitionKey::from_username(&partition_key),
        created_at: row.get("created_at")?,
    })
}

/// The message of a UNIQUE constraint violation, if that is what `err` is.
fn unique_violation(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
            msg.as_deref().filter(|m| m.starts_with("UNIQUE"))
        }
        _ => None,
    }
}

/// Map a contacts-table UNIQUE violation to the field it guards.
fn contact_conflict(err: &rusqlite::Error) -> Option<UniqueField> {
    let msg = unique_violation(err)?;
    if msg.contains("contacts.phone") {
        Some(UniqueField::Phone)
    } else if msg.contains("contacts.email") {
        Some(UniqueField::Email)
    } else {
        None
    }
}

// Helper to escape LIKE wildcards so the term matches literally
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn require_partition(conn: &Connection, owner: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM partitions WHERE partition_key = ?1)",
        params![owner],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StoreError::UnknownPartition(owner.to_string()))
    }
}

/// Check phone then email uniqueness, optionally ignoring one contact.
fn find_conflict(
    tx: &Transaction<'_>,
    owner: &str,
    draft: &ContactDraft,
    exclude: Option<i64>,
) -> Result<Option<UniqueField>> {
    let phone_taken: bool = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM contacts
             WHERE owner = ?1 AND phone = ?2 AND (?3 IS NULL OR id <> ?3))",
        params![owner, draft.phone.as_str(), exclude],
        |row| row.get(0),
    )?;
    if phone_taken {
        return Ok(Some(UniqueField::Phone));
    }

    if let Some(email) = draft.email_str() {
        let email_taken: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM contacts
                 WHERE owner = ?1 AND email = ?2 AND (?3 IS NULL OR id <> ?3))",
            params![owner, email, exclude],
            |row| row.get(0),
        )?;
        if email_taken {
            return Ok(Some(UniqueField::Email));
        }
    }

    Ok(None)
}

fn provision_partition(tx: &Transaction<'_>, key: &str, now: i64) -> Result<()> {
    tx.execute(
        "INSERT INTO partitions (partition_key, created_at) VALUES (?1, ?2)",
        params![key, now],
    )
    .map_err(|e| StoreError::Provision {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn register_user(
        &self,
        username: &Username,
        password_hash: &str,
        now: i64,
    ) -> Result<RegisterResult> {
        let username = username.clone();
        let password_hash = password_hash.to_string();

        self.run(move |conn| {
            let key = username.partition_key();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 OR partition_key = ?2)
                     OR EXISTS(SELECT 1 FROM partitions WHERE partition_key = ?2)",
                params![username.as_str(), key.as_str()],
                |row| row.get(0),
            )?;
            if taken {
                return Ok(RegisterResult::UsernameTaken);
            }

            let inserted = tx.execute(
                "INSERT INTO users (username, password_hash, partition_key, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![username.as_str(), password_hash, key.as_str(), now],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if unique_violation(&e).is_some() => {
                    return Ok(RegisterResult::UsernameTaken)
                }
                Err(e) => return Err(e.into()),
            }
            let user_id = UserId(tx.last_insert_rowid());

            // Dropping the transaction on error rolls back the user row.
            provision_partition(&tx, key.as_str(), now)?;

            tx.commit()?;
            Ok(RegisterResult::Registered(user_id))
        })
        .await
    }

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let username = username.to_string();

        self.run(move |conn| {
            conn.query_row(
                "SELECT id, username, password_hash, partition_key, created_at
                 FROM users WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn has_partition(&self, owner: &PartitionKey) -> Result<bool> {
        let owner = owner.clone();

        self.run(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM partitions WHERE partition_key = ?1)",
                params![owner.as_str()],
                |row| row.get(0),
            )
            .map_err(StoreError::from)
        })
        .await
    }

    async fn list_partitions(&self) -> Result<Vec<PartitionKey>> {
        self.run(|conn| {
            let mut stmt =
                conn.prepare("SELECT partition_key FROM partitions ORDER BY partition_key")?;
            let keys = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .map(|key| key.map(|k| PartitionKey::from_username(&k)))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(keys)
        })
        .await
    }

    async fn list_contacts(&self, owner: &PartitionKey) -> Result<Vec<Contact>> {
        let owner = owner.clone();

        self.run(move |conn| {
            require_partition(conn, owner.as_str())?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts WHERE owner = ?1
                 ORDER BY date_added DESC, id DESC"
            ))?;
            let contacts = stmt
                .query_map(params![owner.as_str()], row_to_contact)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(contacts)
        })
        .await
    }

    async fn get_contact(&self, owner: &PartitionKey, id: ContactId) -> Result<Option<Contact>> {
        let owner = owner.clone();

        self.run(move |conn| {
            require_partition(conn, owner.as_str())?;

            conn.query_row(
                &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE owner = ?1 AND id = ?2"),
                params![owner.as_str(), id.get()],
                row_to_contact,
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn insert_contact(
        &self,
        owner: &PartitionKey,
        draft: &ContactDraft,
        date_added: i64,
    ) -> Result<WriteResult> {
        let owner = owner.clone();
        let draft = draft.clone();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            require_partition(&tx, owner.as_str())?;

            if let Some(field) = find_conflict(&tx, owner.as_str(), &draft, None)? {
                return Ok(WriteResult::Conflict(field));
            }

            let inserted = tx.execute(
                "INSERT INTO contacts (owner, name, phone, email, date_added)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    owner.as_str(),
                    draft.name.as_str(),
                    draft.phone.as_str(),
                    draft.email_str(),
                    date_added,
                ],
            );
            if let Err(e) = inserted {
                return match contact_conflict(&e) {
                    Some(field) => Ok(WriteResult::Conflict(field)),
                    None => Err(e.into()),
                };
            }

            let id = ContactId(tx.last_insert_rowid());
            tx.commit()?;
            Ok(WriteResult::Written(id))
        })
        .await
    }

    async fn update_contact(
        &self,
        owner: &PartitionKey,
        id: ContactId,
        draft: &ContactDraft,
    ) -> Result<WriteResult> {
        let owner = owner.clone();
        let draft = draft.clone();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            require_partition(&tx, owner.as_str())?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM contacts WHERE owner = ?1 AND id = ?2)",
                params![owner.as_str(), id.get()],
                |row| row.get(0),
            )?;
            if !exists {
                return Ok(WriteResult::NotFound);
            }

            if let Some(field) = find_conflict(&tx, owner.as_str(), &draft, Some(id.get()))? {
                return Ok(WriteResult::Conflict(field));
            }

            let updated = tx.execute(
                "UPDATE contacts SET name = ?3, phone = ?4, email = ?5
                 WHERE owner = ?1 AND id = ?2",
                params![
                    owner.as_str(),
                    id.get(),
                    draft.name.as_str(),
                    draft.phone.as_str(),
                    draft.email_str(),
                ],
            );
            if let Err(e) = updated {
                return match contact_conflict(&e) {
                    Some(field) => Ok(WriteResult::Conflict(field)),
                    None => Err(e.into()),
                };
            }

            tx.commit()?;
            Ok(WriteResult::Written(id))
        })
        .await
    }

    async fn delete_contact(&self, owner: &PartitionKey, id: ContactId) -> Result<bool> {
        let owner = owner.clone();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            require_partition(&tx, owner.as_str())?;

            let removed = tx.execute(
                "DELETE FROM contacts WHERE owner = ?1 AND id = ?2",
                params![owner.as_str(), id.get()],
            )?;

            tx.commit()?;
            Ok(removed > 0)
        })
        .await
    }

    async fn search_contacts(&self, owner: &PartitionKey, term: &str) -> Result<Vec<Contact>> {
        let owner = owner.clone();
        let pattern = like_pattern(term);

        self.run(move |conn| {
            require_partition(conn, owner.as_str())?;

            let mut stmt = conn.prepare(&format!(
                r"SELECT {CONTACT_COLUMNS} FROM contacts
                  WHERE owner = ?1
                    AND (name LIKE ?2 ESCAPE '\'
                         OR phone LIKE ?2 ESCAPE '\'
                         OR email LIKE ?2 ESCAPE '\')
                  ORDER BY date_added DESC, id DESC"
            ))?;
            let contacts = stmt
                .query_map(params![owner.as_str(), pattern], row_to_contact)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(contacts)
        })
        .await
    }
}
