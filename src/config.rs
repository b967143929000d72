use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AdminError, Result};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "local_admins.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LocalAdminsConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Realm that authenticates administrators.
    pub admin_realm: String,
    /// Name under which the local admin store is registered as a resolver.
    pub admin_resolver: String,
}

impl Default for LocalAdminsConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/local_admins"),
            log_level: "warn".to_string(),
            admin_realm: "_default_admin_realm_".to_string(),
            admin_resolver: "LinOTP_local_admins".to_string(),
        }
    }
}

impl LocalAdminsConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] when `None`.
    /// A missing file yields the defaults; a broken one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            AdminError::InvalidArgument(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&text).map_err(|e| match e {
            AdminError::InvalidArgument(msg) => {
                AdminError::InvalidArgument(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| AdminError::InvalidArgument(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.admin_realm.trim().is_empty() {
            return Err(AdminError::InvalidArgument("admin_realm must not be empty".into()));
        }
        if self.admin_resolver.trim().is_empty() {
            return Err(AdminError::InvalidArgument("admin_resolver must not be empty".into()));
        }
        Ok(())
    }
}
