//! Credential hashing.
//!
//! Passwords are never stored. Each one is combined with a random 16-byte
//! salt and run through PBKDF2-HMAC-SHA256. Hashes are kept in the PHC string
//! format, which records the algorithm, round count and salt, so the round
//! count can be raised without breaking existing accounts:
//!
//! ```text
//! $pbkdf2-sha256$i=<rounds>,l=32$<salt b64>$<hash b64>
//! ```

use std::fmt;

use pbkdf2::password_hash::{self, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand::RngCore;

use crate::error::CoreError;

/// Default number of PBKDF2 rounds.
pub const DEFAULT_HASH_ROUNDS: u32 = 600_000;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes.
const OUTPUT_LEN: usize = 32;

/// PHC identifier of the only accepted algorithm.
const ALGORITHM: &str = "pbkdf2-sha256";

/// A salted PBKDF2 password hash in PHC string form.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    rounds: u32,
    encoded: String,
}

impl PasswordHash {
    /// Hash a password with a fresh random salt.
    pub fn generate(password: &str, rounds: u32) -> Result<Self, CoreError> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self::with_salt(password, salt, rounds)
    }

    /// Hash a password with a caller-supplied salt. Zero rounds means one.
    pub fn with_salt(password: &str, salt: [u8; SALT_LEN], rounds: u32) -> Result<Self, CoreError> {
        let rounds = rounds.max(1);
        let salt = SaltString::encode_b64(&salt).map_err(hashing)?;
        let params = Params {
            rounds,
            output_length: OUTPUT_LEN,
        };

        let hash = Pbkdf2
            .hash_password_customized(password.as_bytes(), None, None, params, &salt)
            .map_err(hashing)?;

        Ok(Self {
            rounds,
            encoded: hash.to_string(),
        })
    }

    /// Check a candidate password. The digest comparison is constant-time.
    pub fn verify(&self, password: &str) -> bool {
        match password_hash::PasswordHash::new(&self.encoded) {
            Ok(phc) => Pbkdf2.verify_password(password.as_bytes(), &phc).is_ok(),
            Err(_) => false,
        }
    }

    /// Number of PBKDF2 rounds.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// The storable PHC string.
    pub fn encode(&self) -> String {
        self.encoded.clone()
    }

    /// Parse a stored PHC string.
    pub fn parse(encoded: &str) -> Result<Self, CoreError> {
        let malformed = |why: String| CoreError::MalformedPasswordHash(why);

        let phc = password_hash::PasswordHash::new(encoded).map_err(|e| malformed(e.to_string()))?;

        if phc.algorithm.as_str() != ALGORITHM {
            return Err(malformed(format!("unsupported algorithm {}", phc.algorithm)));
        }
        if phc.salt.is_none() || phc.hash.is_none() {
            return Err(malformed("missing salt or hash".to_string()));
        }

        let params = Params::try_from(&phc).map_err(|e| malformed(e.to_string()))?;
        if params.rounds == 0 {
            return Err(malformed("zero rounds".to_string()));
        }

        Ok(Self {
            rounds: params.rounds,
            encoded: encoded.to_string(),
        })
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHash")
            .field("rounds", &self.rounds)
            .finish_non_exhaustive()
    }
}

fn hashing(e: password_hash::Error) -> CoreError {
    CoreError::Hashing(e.to_string())
}
