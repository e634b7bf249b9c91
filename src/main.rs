//! AWS identity helper
//!
//! Resolves temporary AWS credentials for the caller and drops the user into a
//! subshell that carries them.
//!
//! The program performs the following operations:
//! 1. Parses command-line arguments into resolver options
//! 2. Looks up the caller's identity with STS `GetCallerIdentity`
//! 3. Derives the account, MFA device serial and session name the user left out
//! 4. Assumes a role, or requests an MFA session token, or just prints the caller ARN
//! 5. Spawns an interactive subshell with the new credentials in its environment

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

mod arn;
mod cli;
mod credentials;
mod resolver;
mod shell;
mod wire;

use cli::Args;
use credentials::StsIdentityService;
use resolver::Action;
use shell::Subshell;

/// Log targets raised to `trace` by `--debug`. The SDK's `tracing` events reach
/// `env_logger` through the `log` bridge; bodies are logged by [`wire::WireLogger`].
const SDK_TARGETS: &[&str] = &["aws_config", "aws_sdk_sts", "aws_smithy_runtime", "aws_smithy_http"];

/// Main entry point.
///
/// Everything runs on a single thread: one identity lookup, at most one
/// credential request, and at most one child process that is waited on.
///
/// # Returns
/// * `ExitCode::SUCCESS` - identity printed, or the subshell ran and exited
/// * `ExitCode::FAILURE` - any STS call failed, the caller ARN was malformed,
///   or the shell could not be started
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("aws-identity: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Warnings only by default so successful runs stay silent; `--debug` turns on
/// request tracing, bodies included. `RUST_LOG` still applies on top.
fn init_logging(debug: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Warn);
    if debug {
        builder.filter_module(env!("CARGO_CRATE_NAME"), LevelFilter::Trace);
        for target in SDK_TARGETS {
            builder.filter_module(target, LevelFilter::Trace);
        }
    }
    builder.parse_default_env().init();
}

async fn run(args: Args) -> Result<()> {
    let quiet = args.quiet;
    let service = StsIdentityService::from_env(args.debug).await;

    match resolver::resolve(args.into_options(), &service).await? {
        Action::PrintIdentity(arn) => println!("{arn}"),
        Action::Spawn {
            principal,
            credentials,
        } => {
            Subshell::new(principal, credentials).run(quiet)?;
        }
    }

    Ok(())
}
