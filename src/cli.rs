//! Command-line interface definitions.

use clap::{ArgAction, Parser};

use crate::resolver::Options;

/// AWS identity helper.
///
/// Prints the caller's identity, or obtains temporary credentials by assuming a
/// role or authenticating an MFA session, and spawns a subshell carrying them.
/// Account, MFA serial and session name default to values derived from the
/// caller's identity.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_version_flag = true)]
pub struct Args {
    /// Target account, default derived from caller identity
    #[arg(short, long)]
    pub account: Option<String>,

    /// Enable debugging output, including SDK request tracing
    #[arg(short = 'D', long)]
    pub debug: bool,

    /// Lifetime of temporary credentials in seconds (900-129600)
    #[arg(
        short,
        long,
        default_value = "3600",
        value_parser = clap::value_parser!(u32).range(900..=129_600)
    )]
    pub duration: u32,

    /// ARN of MFA device, default derived from caller identity
    #[arg(short, long)]
    pub mfa_serial: Option<String>,

    /// MFA token code
    #[arg(short = 't', long)]
    pub mfa_token: Option<String>,

    /// Minimise output
    #[arg(short, long)]
    pub quiet: bool,

    /// Target role name
    #[arg(short, long)]
    pub role: Option<String>,

    /// Session name, default derived from caller identity
    #[arg(short = 'n', long)]
    pub session_name: Option<String>,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,
}

impl Args {
    /// Converts parsed flags into resolver options. Empty values count as not supplied.
    pub fn into_options(self) -> Options {
        fn supplied(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        Options {
            account: supplied(self.account),
            role: supplied(self.role),
            duration: self.duration,
            session_name: supplied(self.session_name),
            mfa_serial: supplied(self.mfa_serial),
            mfa_token: supplied(self.mfa_token),
        }
    }
}
