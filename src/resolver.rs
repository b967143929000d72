//! Resolver adapter exposing the credential store as an identity source.
//!
//! A realm consults an ordered list of resolvers to look users up and check
//! their passwords. [`LocalAdminResolver`] is the resolver backed by the local
//! admin accounts; its name is a configured constant.

use regex::Regex;

use crate::account::{AdminAccount, CredentialStore};
use crate::error::{AdminError, Result};

/// Attributes a resolver reports for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub username: String,
    pub givenname: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
    pub mobile: String,
}

impl From<&AdminAccount> for UserInfo {
    fn from(account: &AdminAccount) -> Self {
        Self {
            username: account.username.clone(),
            givenname: account.profile.givenname.clone(),
            surname: account.profile.surname.clone(),
            email: account.profile.email.clone(),
            phone: account.profile.phone.clone(),
            mobile: account.profile.mobile.clone(),
        }
    }
}

impl UserInfo {
    fn attribute(&self, field: &str) -> Option<&str> {
        let value = match field {
            "username" => &self.username,
            "givenname" => &self.givenname,
            "surname" => &self.surname,
            "email" => &self.email,
            "phone" => &self.phone,
            "mobile" => &self.mobile,
            _ => return None,
        };
        Some(value.as_str())
    }
}

/// A pluggable identity source.
pub trait Resolver {
    fn name(&self) -> &str;

    /// Resolver-internal id for a login name.
    fn user_id(&self, login: &str) -> Result<Option<String>>;

    /// Login name for a resolver-internal id.
    fn username(&self, user_id: &str) -> Result<Option<String>>;

    fn user_info(&self, user_id: &str) -> Result<Option<UserInfo>>;

    /// Users whose `field` matches `pattern` (`*` matches any run of characters).
    fn user_list(&self, field: &str, pattern: &str) -> Result<Vec<UserInfo>>;

    fn check_pass(&self, user_id: &str, secret: &str) -> Result<bool>;

    fn search_fields(&self) -> &'static [&'static str];
}

const SEARCH_FIELDS: &[&str] = &["username", "givenname", "surname", "email", "phone", "mobile"];

/// Resolver over the local admin credential store. User ids are usernames.
#[derive(Clone)]
pub struct LocalAdminResolver {
    name: String,
    store: CredentialStore,
}

impl LocalAdminResolver {
    pub fn new(name: impl Into<String>, store: CredentialStore) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }
}

impl Resolver for LocalAdminResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn user_id(&self, login: &str) -> Result<Option<String>> {
        Ok(self.store.find(login)?.map(|account| account.username))
    }

    fn username(&self, user_id: &str) -> Result<Option<String>> {
        self.user_id(user_id)
    }

    fn user_info(&self, user_id: &str) -> Result<Option<UserInfo>> {
        Ok(self.store.find(user_id)?.as_ref().map(UserInfo::from))
    }

    fn user_list(&self, field: &str, pattern: &str) -> Result<Vec<UserInfo>> {
        if !SEARCH_FIELDS.contains(&field) {
            return Err(AdminError::InvalidArgument(format!(
                "resolver '{}' cannot search by '{field}'",
                self.name
            )));
        }

        let matcher = wildcard_regex(pattern)?;
        let users = self
            .store
            .list()?
            .iter()
            .map(UserInfo::from)
            .filter(|info| info.attribute(field).is_some_and(|value| matcher.is_match(value)))
            .collect();
        Ok(users)
    }

    fn check_pass(&self, user_id: &str, secret: &str) -> Result<bool> {
        self.store.authenticate(user_id, secret)
    }

    fn search_fields(&self) -> &'static [&'static str] {
        SEARCH_FIELDS
    }
}

/// Anchored regex for a search pattern where `*` is the only metacharacter.
fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("(?s)^{body}$")).map_err(|e| {
        AdminError::InvalidArgument(format!("unusable search pattern '{pattern}': {e}"))
    })
}
