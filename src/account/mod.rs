//! Local admin accounts
//!
//! - Account records with optional contact fields
//! - Argon2id credential hashing
//! - Durable storage with atomic per-account updates

pub mod auth;
pub mod store;
pub mod types;

pub use store::CredentialStore;
pub use types::{AccountProfile, AccountUpdate, AdminAccount, Username};
