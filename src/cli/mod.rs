pub mod account;

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use crate::config::LocalAdminsConfig;
use crate::error::Result;
use crate::manage::AdminManager;
use crate::terminal::Terminal;

use account::{AddArgs, ListArgs, ModifyArgs, PasswordArgs, RemoveArgs};

#[derive(Parser, Debug)]
#[command(name = "local-admins", version)]
#[command(about = "Manage local administrator accounts and the admin realm resolver", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "LOCAL_ADMINS_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database directory, overrides `db_path` from the config file
    #[arg(long, global = true, env = "LOCAL_ADMINS_DB", value_name = "DIR")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a local admin account without a password
    Add(AddArgs),
    /// Make sure the local admin resolver is part of the admin realm
    Enable,
    /// List local admin accounts
    List(ListArgs),
    /// Change profile fields of an account
    Modify(ModifyArgs),
    /// Set the password of an account
    Password(PasswordArgs),
    /// Delete an account
    Remove(RemoveArgs),
}

impl Cli {
    /// Configuration with command-line overrides applied.
    pub fn load_config(&self) -> Result<LocalAdminsConfig> {
        let mut config = LocalAdminsConfig::load(self.config.as_deref())?;
        if let Some(db) = &self.db {
            config.db_path = db.clone();
        }
        Ok(config)
    }
}

/// Run one command. Normal output goes to `out`, prompts to `term`.
pub fn execute(
    command: Commands,
    manager: &AdminManager,
    term: &mut dyn Terminal,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Commands::Add(args) => account::handle_add(args, manager, out),
        Commands::Enable => account::handle_enable(manager, out),
        Commands::List(args) => account::handle_list(args, manager, out),
        Commands::Modify(args) => account::handle_modify(args, manager, out),
        Commands::Password(args) => account::handle_password(args, manager, term, out),
        Commands::Remove(args) => account::handle_remove(args, manager, term, out),
    }
}
