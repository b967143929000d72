//! Local administrator accounts for the admin realm: a credential store,
//! the resolver that exposes it, and the realm binding that enables it.

pub mod account;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod manage;
pub mod realm;
pub mod resolver;
pub mod storage;
pub mod terminal;
