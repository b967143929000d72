use thiserror::Error;

use crate::account::auth::AuthError;
use crate::storage::StorageError;

/// Stable classification of every failure the admin tooling can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateAccount,
    NotFound,
    InvalidFormat,
    InvalidArgument,
    StorageFailure,
    AuthzDenied,
}

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("account '{0}' already exists")]
    DuplicateAccount(String),
    #[error("account '{0}' not found")]
    NotFound(String),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("storage failure: {0}")]
    StorageFailure(String),
    /// Reserved for credential-gated operations. Password resets do not
    /// re-verify the previous password, so nothing raises this yet.
    #[error("not authorized: {0}")]
    AuthzDenied(String),
}

impl AdminError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdminError::DuplicateAccount(_) => ErrorKind::DuplicateAccount,
            AdminError::NotFound(_) => ErrorKind::NotFound,
            AdminError::InvalidFormat(_) => ErrorKind::InvalidFormat,
            AdminError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AdminError::StorageFailure(_) => ErrorKind::StorageFailure,
            AdminError::AuthzDenied(_) => ErrorKind::AuthzDenied,
        }
    }

    /// Process exit status for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::InvalidArgument => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::DuplicateAccount => 4,
            ErrorKind::InvalidFormat => 5,
            ErrorKind::StorageFailure => 6,
            ErrorKind::AuthzDenied => 7,
        }
    }
}

impl From<StorageError> for AdminError {
    fn from(err: StorageError) -> Self {
        AdminError::StorageFailure(err.to_string())
    }
}

impl From<AuthError> for AdminError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmptyPassword => AdminError::InvalidArgument(err.to_string()),
            AuthError::Hash(_) => AdminError::StorageFailure(err.to_string()),
        }
    }
}

pub type Result<T, E = AdminError> = std::result::Result<T, E>;
