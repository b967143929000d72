use clap::Args;
use std::io::Write;

use crate::account::{AccountProfile, AccountUpdate};
use crate::error::{AdminError, Result};
use crate::format::{DEFAULT_TEMPLATE, LONG_TEMPLATE};
use crate::manage::{AdminManager, PasswordSource};
use crate::resolver::Resolver;
use crate::terminal::Terminal;

#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    /// Given name
    #[arg(long)]
    pub givenname: Option<String>,
    /// Surname
    #[arg(long)]
    pub surname: Option<String>,
    /// Email address
    #[arg(long)]
    pub email: Option<String>,
    /// Phone number
    #[arg(long)]
    pub phone: Option<String>,
    /// Mobile number
    #[arg(long)]
    pub mobile: Option<String>,
}

impl From<ProfileArgs> for AccountUpdate {
    fn from(args: ProfileArgs) -> Self {
        AccountUpdate {
            givenname: args.givenname,
            surname: args.surname,
            email: args.email,
            phone: args.phone,
            mobile: args.mobile,
        }
    }
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,
    /// Account name
    pub account: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output template, e.g. "{username} <{email}>"
    #[arg(short, long, value_name = "TEMPLATE", conflicts_with = "long")]
    pub format: Option<String>,
    /// Shorthand for "{username}:{name}:{email}:{phone}:{mobile}"
    #[arg(short, long)]
    pub long: bool,
}

#[derive(Args, Debug)]
pub struct ModifyArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,
    // only here to give a clear error instead of "unexpected argument"
    #[arg(long, hide = true)]
    pub username: Option<String>,
    /// Account name
    pub account: String,
}

#[derive(Args, Debug)]
pub struct PasswordArgs {
    /// New password, or "-" to read it from stdin. Prompts when omitted.
    #[arg(short, long, value_name = "PASSWORD")]
    pub password: Option<String>,
    /// Account name
    pub account: String,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Do not ask for confirmation
    #[arg(long)]
    pub yes: bool,
    /// Account name
    pub account: String,
}

pub fn handle_add(args: AddArgs, manager: &AdminManager, out: &mut dyn Write) -> Result<()> {
    let profile = AccountProfile::from(AccountUpdate::from(args.profile));
    let account = manager.add(&args.account, profile)?;
    writeln!(
        out,
        "Account '{}' created. Run `password` to allow it to log in.",
        account.username
    )
    .map_err(output_failed)
}

pub fn handle_enable(manager: &AdminManager, out: &mut dyn Write) -> Result<()> {
    let resolver = manager.resolver().name();
    let realm = manager.realm().realm();
    let message = if manager.enable()? {
        format!("Resolver '{resolver}' added to realm '{realm}'.")
    } else {
        format!("Resolver '{resolver}' is already part of realm '{realm}'.")
    };
    writeln!(out, "{message}").map_err(output_failed)
}

pub fn handle_list(args: ListArgs, manager: &AdminManager, out: &mut dyn Write) -> Result<()> {
    let template = match (args.long, args.format.as_deref()) {
        (true, _) => LONG_TEMPLATE,
        (false, Some(template)) => template,
        (false, None) => DEFAULT_TEMPLATE,
    };
    for line in manager.list(template)? {
        writeln!(out, "{line}").map_err(output_failed)?;
    }
    Ok(())
}

pub fn handle_modify(args: ModifyArgs, manager: &AdminManager, out: &mut dyn Write) -> Result<()> {
    if args.username.is_some() {
        return Err(AdminError::InvalidArgument(format!(
            "account name '{}' cannot be changed",
            args.account
        )));
    }
    let account = manager.modify(&args.account, &args.profile.into())?;
    writeln!(out, "Account '{}' updated.", account.username).map_err(output_failed)
}

pub fn handle_password(
    args: PasswordArgs,
    manager: &AdminManager,
    term: &mut dyn Terminal,
    out: &mut dyn Write,
) -> Result<()> {
    let source = PasswordSource::from_flag(args.password);
    manager.password(&args.account, source, term)?;
    writeln!(out, "Password for '{}' set.", args.account).map_err(output_failed)
}

pub fn handle_remove(
    args: RemoveArgs,
    manager: &AdminManager,
    term: &mut dyn Terminal,
    out: &mut dyn Write,
) -> Result<()> {
    let confirmed = if args.yes {
        true
    } else {
        // report a missing account before asking about it
        manager.get(&args.account)?;
        term.confirm(&format!("Really remove account '{}'?", args.account))
            .map_err(|e| AdminError::InvalidArgument(format!("cannot read confirmation: {e}")))?
    };
    manager.remove(&args.account, confirmed)?;
    writeln!(out, "Account '{}' removed.", args.account).map_err(output_failed)
}

fn output_failed(e: std::io::Error) -> AdminError {
    AdminError::StorageFailure(format!("cannot write output: {e}"))
}
