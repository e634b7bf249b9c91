use std::fmt;

use anyhow::{Context, Result, anyhow};
use aws_config::SdkConfig;
use aws_sdk_sts::{Client, error::DisplayErrorContext, types};
use aws_smithy_types::{DateTime, date_time::Format};
use log::debug;

use crate::wire::WireLogger;

/// Temporary credentials handed to the subshell.
#[derive(Clone, PartialEq)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<DateTime>,
}

impl TemporaryCredentials {
    /// Expiration as an RFC 3339 timestamp, if known.
    pub fn expires_at(&self) -> Option<String> {
        self.expiration.and_then(|e| e.fmt(Format::DateTime).ok())
    }
}

impl From<&types::Credentials> for TemporaryCredentials {
    fn from(creds: &types::Credentials) -> Self {
        Self {
            access_key_id: creds.access_key_id().to_string(),
            secret_access_key: creds.secret_access_key().to_string(),
            session_token: creds.session_token().to_string(),
            expiration: Some(*creds.expiration()),
        }
    }
}

// Secrets stay out of debug logs.
impl fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("expiration", &self.expires_at())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaChallenge {
    pub serial_number: String,
    pub token_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    pub duration: u32,
    pub role_arn: String,
    pub session_name: String,
    pub mfa: Option<MfaChallenge>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokenRequest {
    pub duration: u32,
    pub mfa: MfaChallenge,
}

/// The three STS calls the resolver depends on.
pub trait IdentityService {
    /// ARN of the principal making the call.
    async fn caller_identity(&self) -> Result<String>;

    async fn assume_role(&self, request: &AssumeRoleRequest) -> Result<TemporaryCredentials>;

    async fn session_token(&self, request: &SessionTokenRequest) -> Result<TemporaryCredentials>;
}

/// [`IdentityService`] backed by AWS STS.
pub struct StsIdentityService {
    client: Client,
}

impl StsIdentityService {
    /// Builds an STS client from the default AWS configuration chain
    /// (environment, shared config and credentials files, instance metadata).
    /// With `trace_bodies`, request and response bodies are logged.
    pub async fn from_env(trace_bodies: bool) -> Self {
        let sdk_config = aws_config::from_env().load().await;
        Self {
            client: Client::from_conf(sts_config(&sdk_config, trace_bodies)),
        }
    }
}

fn sts_config(sdk_config: &SdkConfig, trace_bodies: bool) -> aws_sdk_sts::Config {
    let mut builder = aws_sdk_sts::config::Builder::from(sdk_config);
    if trace_bodies {
        builder = builder.interceptor(WireLogger);
    }
    builder.build()
}

impl IdentityService for StsIdentityService {
    async fn caller_identity(&self) -> Result<String> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?;
        debug!(
            "Caller identity: account={:?} user_id={:?}",
            output.account(),
            output.user_id()
        );
        output
            .arn()
            .map(str::to_string)
            .context("No ARN returned by GetCallerIdentity")
    }

    async fn assume_role(&self, request: &AssumeRoleRequest) -> Result<TemporaryCredentials> {
        let mut call = self
            .client
            .assume_role()
            .duration_seconds(request.duration as i32)
            .role_arn(&request.role_arn)
            .role_session_name(&request.session_name);
        if let Some(mfa) = &request.mfa {
            call = call
                .serial_number(&mfa.serial_number)
                .token_code(&mfa.token_code);
        }

        call.send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?
            .credentials()
            .map(TemporaryCredentials::from)
            .context("No credentials returned")
    }

    async fn session_token(&self, request: &SessionTokenRequest) -> Result<TemporaryCredentials> {
        self.client
            .get_session_token()
            .duration_seconds(request.duration as i32)
            .serial_number(&request.mfa.serial_number)
            .token_code(&request.mfa.token_code)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?
            .credentials()
            .map(TemporaryCredentials::from)
            .context("No credentials returned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_sts_credentials() {
        let sts = types::Credentials::builder()
            .access_key_id("ASIAEXAMPLE")
            .secret_access_key("secret")
            .session_token("token")
            .expiration(DateTime::from_secs(1_700_000_000))
            .build()
            .unwrap();

        let creds = TemporaryCredentials::from(&sts);
        assert_eq!(creds.access_key_id, "ASIAEXAMPLE");
        assert_eq!(creds.secret_access_key, "secret");
        assert_eq!(creds.session_token, "token");
        assert_eq!(creds.expires_at().as_deref(), Some("2023-11-14T22:13:20Z"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let creds = TemporaryCredentials {
            access_key_id: "ASIAEXAMPLE".into(),
            secret_access_key: "very-secret".into(),
            session_token: "very-token".into(),
            expiration: None,
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("ASIAEXAMPLE"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("very-token"));
    }

    #[test]
    fn sts_config_keeps_shared_settings() {
        let sdk_config = SdkConfig::builder()
            .region(aws_config::Region::new("eu-west-1"))
            .build();

        for trace_bodies in [false, true] {
            let config = sts_config(&sdk_config, trace_bodies);
            assert_eq!(config.region().map(|r| r.as_ref()), Some("eu-west-1"));
        }
    }
}
