//! Configuration for the Rolodex facade.

use std::path::PathBuf;
use std::time::Duration;

use rolodex_core::DEFAULT_HASH_ROUNDS;

use crate::throttle;

/// Configuration for [`crate::Rolodex`].
#[derive(Debug, Clone)]
pub struct RolodexConfig {
    /// SQLite database file. `None` opens an in-memory database.
    pub database_path: Option<PathBuf>,
    /// Consecutive failed logins before a username is locked. `0` disables
    /// the throttle.
    pub max_login_attempts: u32,
    /// How long a locked username stays locked. Failures older than this
    /// are forgotten.
    pub lockout: Duration,
    /// Usernames the login throttle tracks at once.
    pub max_tracked_logins: usize,
    /// Whether to cache contact lists per owner.
    pub cache_contacts: bool,
    /// Extra attempts for writes that hit a transient storage fault.
    pub transient_retries: u32,
    /// Pause between those attempts.
    pub retry_backoff: Duration,
    /// Derivation rounds for new password hashes.
    pub hash_rounds: u32,
}

impl Default for RolodexConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            max_login_attempts: 3,
            lockout: Duration::from_secs(60),
            max_tracked_logins: throttle::DEFAULT_CAPACITY,
            cache_contacts: true,
            transient_retries: 2,
            retry_backoff: Duration::from_millis(50),
            hash_rounds: DEFAULT_HASH_ROUNDS,
        }
    }
}

impl RolodexConfig {
    /// Use a database file at `path`.
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }
}
