//! Account management operations behind the CLI.

use tracing::{debug, info};

use crate::account::{AccountProfile, AccountUpdate, AdminAccount, CredentialStore};
use crate::config::LocalAdminsConfig;
use crate::error::{AdminError, Result};
use crate::format::Template;
use crate::realm::RealmMembership;
use crate::resolver::LocalAdminResolver;
use crate::storage::Storage;
use crate::terminal::Terminal;

/// Where a new password comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum PasswordSource {
    /// Given directly on the command line.
    Value(String),
    /// Typed twice at a hidden prompt.
    Prompt,
    /// One raw line from stdin, no confirmation. For scripts.
    Stream,
}

impl PasswordSource {
    /// `-p -` reads stdin, `-p <pw>` uses the value, no flag prompts.
    pub fn from_flag(flag: Option<String>) -> Self {
        match flag {
            Some(value) if value == "-" => PasswordSource::Stream,
            Some(value) => PasswordSource::Value(value),
            None => PasswordSource::Prompt,
        }
    }

    pub fn resolve(self, username: &str, term: &mut dyn Terminal) -> Result<String> {
        let read_failed =
            |e: std::io::Error| AdminError::InvalidArgument(format!("cannot read password: {e}"));

        match self {
            PasswordSource::Value(value) => Ok(value),
            PasswordSource::Stream => term.read_raw_line().map_err(read_failed),
            PasswordSource::Prompt => {
                let first = term
                    .read_secret(&format!("New password for {username}: "))
                    .map_err(read_failed)?;
                let second = term
                    .read_secret("Confirm password: ")
                    .map_err(read_failed)?;
                if first != second {
                    return Err(AdminError::InvalidArgument(format!(
                        "passwords for '{username}' do not match"
                    )));
                }
                Ok(first)
            }
        }
    }
}

impl std::fmt::Debug for PasswordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordSource::Value(_) => f.write_str("Value(<redacted>)"),
            PasswordSource::Prompt => f.write_str("Prompt"),
            PasswordSource::Stream => f.write_str("Stream"),
        }
    }
}

/// Entry point for every admin account operation.
pub struct AdminManager {
    store: CredentialStore,
    resolver: LocalAdminResolver,
    realm: RealmMembership,
}

impl AdminManager {
    pub fn new(storage: Storage, realm: &str, resolver: &str) -> Self {
        let store = CredentialStore::new(storage.clone());
        Self {
            resolver: LocalAdminResolver::new(resolver, store.clone()),
            realm: RealmMembership::new(storage, realm),
            store,
        }
    }

    pub fn open(config: &LocalAdminsConfig) -> Result<Self> {
        let storage = Storage::open(&config.db_path)?;
        Ok(Self::new(storage, &config.admin_realm, &config.admin_resolver))
    }

    pub fn resolver(&self) -> &LocalAdminResolver {
        &self.resolver
    }

    pub fn realm(&self) -> &RealmMembership {
        &self.realm
    }

    /// Create an account. It has no password, so it cannot log in until
    /// [`AdminManager::password`] is run.
    pub fn add(&self, username: &str, profile: AccountProfile) -> Result<AdminAccount> {
        self.store.create(username, profile)
    }

    pub fn get(&self, username: &str) -> Result<AdminAccount> {
        self.store.get(username)
    }

    pub fn modify(&self, username: &str, update: &AccountUpdate) -> Result<AdminAccount> {
        if update.is_empty() {
            debug!(username, "empty update, nothing to modify");
            return self.store.get(username);
        }
        self.store.update(username, update)
    }

    /// Set the account's password. The previous password is not checked.
    pub fn password(
        &self,
        username: &str,
        source: PasswordSource,
        term: &mut dyn Terminal,
    ) -> Result<()> {
        // don't prompt for an account that isn't there
        self.store.get(username)?;
        let secret = source.resolve(username, term)?;
        self.store.set_password(username, &secret)
    }

    /// Delete an account. `confirmed` must be set by the caller after
    /// whatever confirmation it requires; otherwise nothing is removed.
    pub fn remove(&self, username: &str, confirmed: bool) -> Result<AdminAccount> {
        if !confirmed {
            return Err(AdminError::InvalidArgument(format!(
                "removal of '{username}' not confirmed, aborted"
            )));
        }
        self.store.remove(username)
    }

    /// One rendered line per account, ordered by username.
    pub fn list(&self, template: &str) -> Result<Vec<String>> {
        let template = Template::parse(template)?;
        let accounts = self.store.list()?;
        Ok(accounts.iter().map(|a| template.render(a)).collect())
    }

    /// Ensure the local admin resolver is in the admin realm.
    pub fn enable(&self) -> Result<bool> {
        let added = self.realm.enable(&self.resolver)?;
        if added {
            info!(realm = self.realm.realm(), "local admin resolver enabled");
        }
        Ok(added)
    }

    pub fn authenticate(&self, username: &str, secret: &str) -> Result<bool> {
        self.store.authenticate(username, secret)
    }
}
