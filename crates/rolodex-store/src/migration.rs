//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use rolodex_core::now_millis;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
        tracing::debug!(from = current, to = CURRENT_VERSION, "schema migrated");
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per owner; contacts hang off it
        CREATE TABLE partitions (
            partition_key TEXT PRIMARY KEY,    -- sanitized username
            created_at INTEGER NOT NULL
        );

        -- Registered users
        CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password_hash TEXT NOT NULL,       -- PHC string, $pbkdf2-sha256$...
            partition_key TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL        -- Unix ms
        );

        -- Contacts of every owner
        CREATE TABLE contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner TEXT NOT NULL REFERENCES partitions(partition_key) ON DELETE CASCADE,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,               -- canonical 10 digits
            email TEXT COLLATE NOCASE,         -- NULL when absent, never ''
            date_added INTEGER NOT NULL        -- Unix ms
        );

        -- Per-owner uniqueness; NULL emails never collide
        CREATE UNIQUE INDEX idx_contacts_owner_phone ON contacts(owner, phone);
        CREATE UNIQUE INDEX idx_contacts_owner_email ON contacts(owner, email);

        -- Listing order
        CREATE INDEX idx_contacts_owner_added ON contacts(owner, date_added DESC, id DESC);
        "#,
    )?;

    Ok(())
}
