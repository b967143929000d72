//! Admin realm membership.
//!
//! The admin realm holds an ordered list of resolver names. This module can
//! only ever add the local admin resolver to that list: it has no way to
//! remove a resolver from the realm or to delete the resolver itself, so its
//! own actions cannot lock administrators out.
//!
//! Lockout is still possible through external configuration: if the
//! configured realm or resolver name does not match what the authentication
//! server uses, `enable` succeeds against a realm nobody consults.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AdminError, Result};
use crate::resolver::Resolver;
use crate::storage::{Change, Storage, REALMS_TREE};

/// Ordered, duplicate-free resolver list of one realm
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolverBinding {
    resolvers: Vec<String>,
}

impl ResolverBinding {
    /// Later repeats of a name are dropped; first-seen order is kept.
    pub fn new(resolvers: impl IntoIterator<Item = String>) -> Self {
        let mut binding = Self::default();
        for resolver in resolvers {
            binding.ensure(&resolver);
        }
        binding
    }

    pub fn resolvers(&self) -> &[String] {
        &self.resolvers
    }

    pub fn contains(&self, resolver: &str) -> bool {
        self.resolvers.iter().any(|r| r == resolver)
    }

    /// Append `resolver` unless present. Returns whether the list changed.
    pub fn ensure(&mut self, resolver: &str) -> bool {
        if self.contains(resolver) {
            return false;
        }
        self.resolvers.push(resolver.to_string());
        true
    }
}

pub struct RealmMembership {
    storage: Storage,
    realm: String,
}

impl RealmMembership {
    pub fn new(storage: Storage, realm: impl Into<String>) -> Self {
        Self {
            storage,
            realm: realm.into(),
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Current resolver list; empty if the realm has never been written.
    pub fn binding(&self) -> Result<ResolverBinding> {
        Ok(self
            .storage
            .get::<ResolverBinding>(REALMS_TREE, &self.realm)?
            .unwrap_or_default())
    }

    /// Make sure `resolver` is part of the realm.
    ///
    /// Idempotent. Returns `true` if the resolver was appended, `false` if it
    /// was already present. Concurrent callers are serialised by the store's
    /// compare-and-swap; a persistent conflict surfaces as a storage failure.
    pub fn enable(&self, resolver: &dyn Resolver) -> Result<bool> {
        let name = resolver.name();
        let changed = self.storage.update::<ResolverBinding, _, AdminError, _>(
            REALMS_TREE,
            &self.realm,
            |current| {
                let mut binding = current.unwrap_or_default();
                if binding.ensure(name) {
                    Ok((Change::Put(binding), true))
                } else {
                    Ok((Change::Keep, false))
                }
            },
        )?;

        if changed {
            info!(realm = %self.realm, resolver = name, "added resolver to realm");
        } else {
            info!(realm = %self.realm, resolver = name, "resolver already in realm");
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::CredentialStore;
    use crate::resolver::LocalAdminResolver;
    use crate::storage::StorageError;

    const REALM: &str = "_default_admin_realm_";
    const RESOLVER: &str = "LinOTP_local_admins";

    fn setup() -> (Storage, RealmMembership, LocalAdminResolver) {
        let storage = Storage::temporary().unwrap();
        let membership = RealmMembership::new(storage.clone(), REALM);
        let resolver = LocalAdminResolver::new(RESOLVER, CredentialStore::new(storage.clone()));
        (storage, membership, resolver)
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let mut binding = ResolverBinding::default();
        assert!(binding.ensure("a"));
        assert!(!binding.ensure("a"));
        assert_eq!(binding.resolvers(), ["a".to_string()]);
    }

    #[test]
    fn test_new_drops_repeats() {
        let names = ["sql", "ldap", "sql", RESOLVER, "ldap"].map(String::from);
        let binding = ResolverBinding::new(names);
        assert_eq!(binding.resolvers(), ["sql", "ldap", RESOLVER].map(String::from));
    }

    #[test]
    fn test_enable_on_empty_realm() {
        let (_, membership, resolver) = setup();
        assert!(membership.binding().unwrap().resolvers().is_empty());

        assert!(membership.enable(&resolver).unwrap());
        assert_eq!(membership.binding().unwrap().resolvers(), [RESOLVER.to_string()]);
    }

    #[test]
    fn test_enable_twice_matches_once() {
        let (_, membership, resolver) = setup();
        assert!(membership.enable(&resolver).unwrap());
        let once = membership.binding().unwrap();

        assert!(!membership.enable(&resolver).unwrap());
        assert_eq!(membership.binding().unwrap(), once);
    }

    #[test]
    fn test_enable_appends_after_existing() {
        let (storage, membership, resolver) = setup();
        let existing = vec!["ldap".to_string(), "sql".to_string(), "passwd".to_string()];
        storage
            .update::<ResolverBinding, _, StorageError, _>(REALMS_TREE, REALM, |_| {
                Ok((Change::Put(ResolverBinding::new(existing.clone())), ()))
            })
            .unwrap();

        assert!(membership.enable(&resolver).unwrap());

        let binding = membership.binding().unwrap();
        assert_eq!(binding.resolvers().len(), 4);
        assert_eq!(&binding.resolvers()[..3], existing.as_slice());
        assert_eq!(binding.resolvers()[3], RESOLVER);
    }

    #[test]
    fn test_enable_keeps_position_when_present() {
        let (storage, membership, resolver) = setup();
        let existing = vec!["ldap".to_string(), RESOLVER.to_string(), "sql".to_string()];
        storage
            .update::<ResolverBinding, _, StorageError, _>(REALMS_TREE, REALM, |_| {
                Ok((Change::Put(ResolverBinding::new(existing.clone())), ()))
            })
            .unwrap();

        assert!(!membership.enable(&resolver).unwrap());
        assert_eq!(membership.binding().unwrap().resolvers(), existing.as_slice());
    }

    #[test]
    fn test_other_realms_untouched() {
        let (storage, membership, resolver) = setup();
        membership.enable(&resolver).unwrap();

        let other = RealmMembership::new(storage, "users");
        assert!(other.binding().unwrap().resolvers().is_empty());
        assert_eq!(membership.realm(), REALM);
    }
}
