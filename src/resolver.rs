//! Identity resolution and operation selection
//!
//! Every run starts from the caller's own identity. Values the user left out
//! (target account, MFA device serial, session name) are derived from it, and
//! the supplied options then select exactly one operation:
//!
//! 1. `--role` given: assume `arn:aws:iam::{account}:role/{role}`, attaching the
//!    MFA serial and token to the same call when a token was supplied.
//! 2. `--mfa-token` given without a role: request an MFA session token for the
//!    caller.
//! 3. Neither: report the caller's ARN.
//!
//! The resolver performs network calls only. Printing and process creation are
//! left to the caller, which keeps every failure an ordinary `Err`.

use std::fmt;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    arn::{self, CallerArn},
    credentials::{
        AssumeRoleRequest, IdentityService, MfaChallenge, SessionTokenRequest,
        TemporaryCredentials,
    },
};

/// Operating parameters taken from the command line.
///
/// `None` means "not supplied"; those fields are back-filled from the caller's
/// identity during [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub account: Option<String>,
    pub role: Option<String>,
    /// Credential lifetime in seconds
    pub duration: u32,
    pub session_name: Option<String>,
    pub mfa_serial: Option<String>,
    pub mfa_token: Option<String>,
}

/// Options with every identity-derived default filled in.
#[derive(Clone, PartialEq, Eq)]
pub struct Resolved {
    pub account: String,
    pub role: Option<String>,
    pub duration: u32,
    pub session_name: String,
    pub mfa_serial: String,
    pub mfa_token: Option<String>,
}

impl Resolved {
    /// Fills unsupplied fields from the caller's identity. The default MFA
    /// serial always names a device in the caller's own account.
    pub fn new(options: Options, caller: &CallerArn) -> Self {
        let Options {
            account,
            role,
            duration,
            session_name,
            mfa_serial,
            mfa_token,
        } = options;

        Self {
            account: account.unwrap_or_else(|| caller.account().to_string()),
            role,
            duration,
            session_name: session_name.unwrap_or_else(|| caller.principal().to_string()),
            mfa_serial: mfa_serial
                .unwrap_or_else(|| arn::mfa_serial(caller.account(), caller.principal())),
            mfa_token,
        }
    }

    fn mfa_challenge(&self) -> Option<MfaChallenge> {
        self.mfa_token.as_ref().map(|token| MfaChallenge {
            serial_number: self.mfa_serial.clone(),
            token_code: token.clone(),
        })
    }
}

// The token code stays out of debug logs.
impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("account", &self.account)
            .field("role", &self.role)
            .field("duration", &self.duration)
            .field("session_name", &self.session_name)
            .field("mfa_serial", &self.mfa_serial)
            .field("mfa_token", &self.mfa_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

/// What the program should do once resolution succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Print the caller's ARN.
    PrintIdentity(String),
    /// Launch a subshell for `principal` carrying `credentials`.
    Spawn {
        principal: String,
        credentials: TemporaryCredentials,
    },
}

/// Resolves the caller's identity and runs at most one credential request.
///
/// # Errors
///
/// Returns an error if any STS call fails or the caller ARN is malformed.
/// Nothing is retried.
pub async fn resolve<S: IdentityService>(options: Options, service: &S) -> Result<Action> {
    let caller = service
        .caller_identity()
        .await
        .context("Failed to get caller identity")?;
    let caller = CallerArn::parse(&caller)?;
    debug!(
        "Caller {caller}: account={} principal={}",
        caller.account(),
        caller.principal()
    );

    let resolved = Resolved::new(options, &caller);
    debug!("Resolved options: {resolved:?}");

    if let Some(role) = &resolved.role {
        let role_arn = arn::role_arn(&resolved.account, role);
        info!("Assuming {role_arn} - Duration: {}s", resolved.duration);

        let request = AssumeRoleRequest {
            duration: resolved.duration,
            role_arn: role_arn.clone(),
            session_name: resolved.session_name.clone(),
            mfa: resolved.mfa_challenge(),
        };
        let credentials = service
            .assume_role(&request)
            .await
            .with_context(|| format!("Failed to assume {role_arn}"))?;

        return Ok(Action::Spawn {
            principal: format!("role {role_arn}"),
            credentials,
        });
    }

    if let Some(mfa) = resolved.mfa_challenge() {
        info!(
            "Requesting session token with {} - Duration: {}s",
            mfa.serial_number, resolved.duration
        );

        let request = SessionTokenRequest {
            duration: resolved.duration,
            mfa,
        };
        let credentials = service
            .session_token(&request)
            .await
            .context("Failed to get MFA session token")?;

        return Ok(Action::Spawn {
            principal: format!("user {caller}"),
            credentials,
        });
    }

    Ok(Action::PrintIdentity(caller.to_string()))
}
