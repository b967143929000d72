//! Credential store: durable CRUD for local admin accounts

use chrono::Utc;
use tracing::{debug, info};

use super::auth::{hash_password, verify_password};
use super::types::{validate_username, AccountProfile, AccountUpdate, AdminAccount};
use crate::error::{AdminError, Result};
use crate::storage::{Change, Storage, ADMINS_TREE};

/// Account store backed by the `admins` tree
#[derive(Clone)]
pub struct CredentialStore {
    storage: Storage,
}

impl CredentialStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Create an account without a password.
    pub fn create(&self, username: &str, profile: AccountProfile) -> Result<AdminAccount> {
        validate_username(username)?;

        let account = self.storage.update(ADMINS_TREE, username, |current: Option<AdminAccount>| {
            if current.is_some() {
                return Err(AdminError::DuplicateAccount(username.to_string()));
            }
            let account = AdminAccount::new(username.to_string(), profile.clone(), now());
            Ok((Change::Put(account.clone()), account))
        })?;

        info!(username, "created admin account");
        Ok(account)
    }

    pub fn find(&self, username: &str) -> Result<Option<AdminAccount>> {
        Ok(self.storage.get(ADMINS_TREE, username)?)
    }

    pub fn get(&self, username: &str) -> Result<AdminAccount> {
        self.find(username)?
            .ok_or_else(|| AdminError::NotFound(username.to_string()))
    }

    /// Apply a partial profile update and return the stored result.
    pub fn update(&self, username: &str, update: &AccountUpdate) -> Result<AdminAccount> {
        let account = self.modify_existing(username, |account| {
            update.apply_to(&mut account.profile);
            account.updated_at = now();
        })?;
        info!(username, "updated admin account");
        Ok(account)
    }

    /// Hash `secret` and store it as the account's credential.
    pub fn set_password(&self, username: &str, secret: &str) -> Result<()> {
        // fail fast before paying for the hash
        self.get(username)?;
        let hash = hash_password(secret)?;

        self.modify_existing(username, |account| {
            account.set_password_hash(hash.clone(), now());
        })?;
        info!(username, "password set for admin account");
        Ok(())
    }

    pub fn remove(&self, username: &str) -> Result<AdminAccount> {
        let removed = self.storage.update(ADMINS_TREE, username, |current: Option<AdminAccount>| {
            match current {
                Some(account) => Ok((Change::Delete, account)),
                None => Err(AdminError::NotFound(username.to_string())),
            }
        })?;
        info!(username, "removed admin account");
        Ok(removed)
    }

    /// All accounts, ordered by username.
    pub fn list(&self) -> Result<Vec<AdminAccount>> {
        let accounts = self
            .storage
            .scan::<AdminAccount>(ADMINS_TREE)?
            .into_iter()
            .map(|(_, account)| account)
            .collect();
        Ok(accounts)
    }

    /// Check `secret` against the stored credential. Unknown accounts and
    /// accounts without a password always fail.
    pub fn authenticate(&self, username: &str, secret: &str) -> Result<bool> {
        let Some(account) = self.find(username)? else {
            debug!(username, "authentication for unknown account");
            return Ok(false);
        };
        Ok(match account.password_hash() {
            Some(hash) => verify_password(secret, hash),
            None => {
                debug!(username, "authentication for account without password");
                false
            }
        })
    }

    fn modify_existing<F>(&self, username: &str, mut edit: F) -> Result<AdminAccount>
    where
        F: FnMut(&mut AdminAccount),
    {
        self.storage.update(ADMINS_TREE, username, |current: Option<AdminAccount>| {
            let mut account = current.ok_or_else(|| AdminError::NotFound(username.to_string()))?;
            edit(&mut account);
            Ok((Change::Put(account.clone()), account))
        })
    }
}

fn now() -> i64 {
    Utc::now().timestamp_millis()
}
