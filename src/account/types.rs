//! Local admin account records

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AdminError, Result};

/// Account identifier - the login name
pub type Username = String;

/// Stored record of one local admin account
#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub struct AdminAccount {
    pub username: Username,
    pub profile: AccountProfile,

    // Argon2id PHC string, `None` until a password is set
    password_hash: Option<String>,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Contact and naming attributes, all optional (empty string = unset)
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountProfile {
    pub givenname: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
    pub mobile: String,
}

/// Partial profile change. `None` leaves a field untouched, `Some("")`
/// clears it. The username has no slot here: it cannot be changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountUpdate {
    pub givenname: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
}

impl AdminAccount {
    pub(crate) fn new(username: Username, profile: AccountProfile, now: i64) -> Self {
        Self {
            username,
            profile,
            password_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `givenname surname`, without the separator when either is empty.
    pub fn display_name(&self) -> String {
        let given = self.profile.givenname.trim();
        let surname = self.profile.surname.trim();
        match (given.is_empty(), surname.is_empty()) {
            (false, false) => format!("{given} {surname}"),
            (false, true) => given.to_string(),
            (true, false) => surname.to_string(),
            (true, true) => String::new(),
        }
    }

    /// Whether a credential is present. Accounts without one cannot log in.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    pub(crate) fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub(crate) fn set_password_hash(&mut self, hash: String, now: i64) {
        self.password_hash = Some(hash);
        self.updated_at = now;
    }
}

impl fmt::Debug for AdminAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAccount")
            .field("username", &self.username)
            .field("profile", &self.profile)
            .field("password_hash", &self.password_hash.as_ref().map(|_| "<redacted>"))
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl AccountProfile {
    pub fn builder() -> AccountUpdate {
        AccountUpdate::default()
    }
}

impl From<AccountUpdate> for AccountProfile {
    fn from(update: AccountUpdate) -> Self {
        let mut profile = AccountProfile::default();
        update.apply_to(&mut profile);
        profile
    }
}

impl AccountUpdate {
    pub fn givenname(mut self, value: impl Into<String>) -> Self {
        self.givenname = Some(value.into());
        self
    }

    pub fn surname(mut self, value: impl Into<String>) -> Self {
        self.surname = Some(value.into());
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    pub fn phone(mut self, value: impl Into<String>) -> Self {
        self.phone = Some(value.into());
        self
    }

    pub fn mobile(mut self, value: impl Into<String>) -> Self {
        self.mobile = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &AccountUpdate::default()
    }

    pub fn apply_to(&self, profile: &mut AccountProfile) {
        let slots = [
            (&self.givenname, &mut profile.givenname),
            (&self.surname, &mut profile.surname),
            (&self.email, &mut profile.email),
            (&self.phone, &mut profile.phone),
            (&self.mobile, &mut profile.mobile),
        ];
        for (change, field) in slots {
            if let Some(value) = change {
                *field = value.clone();
            }
        }
    }
}

/// Usernames must be non-empty and free of whitespace, control characters
/// and `:` (the long listing separator).
pub fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(AdminError::InvalidArgument(
            "account name must not be empty".to_string(),
        ));
    }
    if username
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || c == ':')
    {
        return Err(AdminError::InvalidArgument(format!(
            "account name '{username}' contains whitespace, control characters or ':'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(given: &str, surname: &str) -> AdminAccount {
        let profile = AccountProfile::builder().givenname(given).surname(surname).into();
        AdminAccount::new("alovelace".to_string(), profile, 0)
    }

    #[test]
    fn test_display_name() {
        assert_eq!(account("Ada", "Lovelace").display_name(), "Ada Lovelace");
        assert_eq!(account("", "Turing").display_name(), "Turing");
        assert_eq!(account("Alan", "").display_name(), "Alan");
        assert_eq!(account("", "").display_name(), "");
    }

    #[test]
    fn test_update_leaves_unspecified_fields() {
        let mut profile: AccountProfile = AccountProfile::builder()
            .givenname("Ada")
            .email("a@example.com")
            .phone("123")
            .into();

        AccountUpdate::default().email("").mobile("555").apply_to(&mut profile);

        assert_eq!(profile.givenname, "Ada");
        assert_eq!(profile.email, "");
        assert_eq!(profile.phone, "123");
        assert_eq!(profile.mobile, "555");
    }

    #[test]
    fn test_debug_redacts_hash() {
        let mut acc = account("Ada", "Lovelace");
        acc.set_password_hash("$argon2id$secret-material".to_string(), 1);
        let out = format!("{acc:?}");
        assert!(out.contains("<redacted>"));
        assert!(!out.contains("secret-material"));
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("first.last@example.com").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("two words").is_err());
        assert!(validate_username("a:b").is_err());
    }
}
