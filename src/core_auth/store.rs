use crate::constants::DEMO_USERS;
use crate::core_auth::core_auth::PasswdEntry;
use crate::core_auth::AuthError;
use crate::core_auth::helper::{hash_cost, hash_password, load_passwd_file, verify_password};
use bcrypt::DEFAULT_COST;
use log::warn;
use std::collections::HashMap;
use std::path::Path;

/// Account lookup used by USER and PASS.
///
/// Shared read-only between every session, so implementations must be
/// safe to call concurrently.
pub trait CredentialStore: Send + Sync {
    fn exists(&self, username: &str) -> bool;
    fn verify(&self, username: &str, password: &str) -> bool;
}

pub struct PasswdStore {
    entries: HashMap<String, PasswdEntry>,
    // Verified against for unknown users so both paths pay one bcrypt check
    decoy_hash: String,
}

impl PasswdStore {
    pub fn from_entries(entries: HashMap<String, PasswdEntry>) -> Result<Self, AuthError> {
        let cost = entries
            .values()
            .find_map(|entry| hash_cost(entry.get_hashed_password()))
            .unwrap_or(DEFAULT_COST);
        let decoy_hash = hash_password("decoy-password", cost)?;
        Ok(Self {
            entries,
            decoy_hash,
        })
    }

    pub fn load(path: &Path) -> Result<Self, AuthError> {
        Self::from_entries(load_passwd_file(path)?)
    }

    /// Builds a store from plaintext pairs, hashing each at `cost`.
    pub fn from_plain(users: &[(&str, &str)], cost: u32) -> Result<Self, AuthError> {
        let mut entries = HashMap::new();
        for (username, password) in users {
            let hashed = hash_password(password, cost)?;
            entries.insert(username.to_string(), PasswdEntry::new(username, &hashed));
        }
        Self::from_entries(entries)
    }

    pub fn demo() -> Result<Self, AuthError> {
        warn!(
            "No passwd file configured, using {} built-in demo account(s)",
            DEMO_USERS.len()
        );
        Self::from_plain(DEMO_USERS, DEFAULT_COST)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CredentialStore for PasswdStore {
    fn exists(&self, username: &str) -> bool {
        self.entries.contains_key(username)
    }

    fn verify(&self, username: &str, password: &str) -> bool {
        match self.entries.get(username) {
            Some(entry) => verify_password(password, entry.get_hashed_password()),
            None => {
                let _ = verify_password(password, &self.decoy_hash);
                false
            }
        }
    }
}
