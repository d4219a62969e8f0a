//! Export and import of a contact book.
//!
//! Exports are lists of [`ContactRecord`], newest first, without storage
//! ids. Importing re-validates every record and keeps its `date_added`, so an
//! export imported into an empty book lists back the same field values.

use rolodex_core::{ContactId, ContactRecord};

use crate::error::{Result, RolodexError};

/// A record that was not imported.
#[derive(Debug)]
pub struct ImportRejection {
    /// Position of the record in the input.
    pub index: usize,
    pub reason: RolodexError,
}

/// What an import did.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Ids of the new contacts, in input order.
    pub imported: Vec<ContactId>,
    /// Records skipped for validation failures or duplicates.
    pub rejected: Vec<ImportRejection>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Render records as pretty-printed JSON.
pub fn to_json(records: &[ContactRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Parse records from JSON produced by [`to_json`].
pub fn from_json(json: &str) -> Result<Vec<ContactRecord>> {
    Ok(serde_json::from_str(json)?)
}
