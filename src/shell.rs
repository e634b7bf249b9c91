//! Interactive subshell carrying temporary credentials.

use std::{
    env,
    ffi::OsString,
    process::{Command, ExitStatus, Stdio},
};

use anyhow::{Context, Result};
use log::debug;

use crate::credentials::TemporaryCredentials;

const DEFAULT_SHELL: &str = "bash";

pub struct Subshell {
    program: OsString,
    principal: String,
    credentials: TemporaryCredentials,
}

impl Subshell {
    /// Uses `$SHELL`, falling back to `bash`.
    pub fn new(principal: String, credentials: TemporaryCredentials) -> Self {
        let program = env::var_os("SHELL")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SHELL.into());
        Self::with_program(program, principal, credentials)
    }

    pub fn with_program(
        program: impl Into<OsString>,
        principal: String,
        credentials: TemporaryCredentials,
    ) -> Self {
        Self {
            program: program.into(),
            principal,
            credentials,
        }
    }

    pub fn announcement(&self, quiet: bool) -> Option<String> {
        (!quiet).then(|| format!("Spawning subshell for {}", self.principal))
    }

    /// The child inherits the parent's environment and standard streams; only
    /// the three credential variables are added.
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-i")
            .env("AWS_ACCESS_KEY_ID", &self.credentials.access_key_id)
            .env("AWS_SECRET_ACCESS_KEY", &self.credentials.secret_access_key)
            .env("AWS_SESSION_TOKEN", &self.credentials.session_token)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        command
    }

    /// Announces the shell (unless quiet), runs it and waits for it to exit.
    ///
    /// The shell's own exit status is returned but not treated as an error.
    pub fn run(&self, quiet: bool) -> Result<ExitStatus> {
        if let Some(line) = self.announcement(quiet) {
            println!("{line}");
        }
        if let Some(expiry) = self.credentials.expires_at() {
            debug!("Credentials expire at: {expiry}");
        }

        let status = self
            .command()
            .status()
            .with_context(|| format!("Failed to spawn shell {:?}", self.program))?;
        debug!("Subshell exited with {status}");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, ffi::OsStr};

    use super::*;

    fn creds() -> TemporaryCredentials {
        TemporaryCredentials {
            access_key_id: "ASIAEXAMPLE".into(),
            secret_access_key: "secret".into(),
            session_token: "token".into(),
            expiration: None,
        }
    }

    fn shell(program: &str) -> Subshell {
        Subshell::with_program(program, "role arn:aws:iam::1:role/x".into(), creds())
    }

    #[test]
    fn injects_exactly_the_credential_variables() {
        let command = shell("bash").command();
        let envs: HashMap<&OsStr, Option<&OsStr>> = command.get_envs().collect();

        assert_eq!(envs.len(), 3);
        assert_eq!(
            envs[OsStr::new("AWS_ACCESS_KEY_ID")],
            Some(OsStr::new("ASIAEXAMPLE"))
        );
        assert_eq!(
            envs[OsStr::new("AWS_SECRET_ACCESS_KEY")],
            Some(OsStr::new("secret"))
        );
        assert_eq!(
            envs[OsStr::new("AWS_SESSION_TOKEN")],
            Some(OsStr::new("token"))
        );
    }

    #[test]
    fn runs_interactive_shell() {
        let command = shell("/bin/zsh").command();
        assert_eq!(command.get_program(), "/bin/zsh");
        assert_eq!(command.get_args().collect::<Vec<_>>(), vec!["-i"]);
    }

    #[test]
    fn quiet_suppresses_announcement() {
        let shell = shell("bash");
        assert_eq!(
            shell.announcement(false).as_deref(),
            Some("Spawning subshell for role arn:aws:iam::1:role/x")
        );
        assert_eq!(shell.announcement(true), None);
    }

    #[cfg(unix)]
    #[test]
    fn child_sees_credentials_and_parent_env_is_untouched() {
        let before = env::var_os("AWS_SESSION_TOKEN");

        let output = shell("sh")
            .command()
            .args(["-c", "printf '%s' \"$AWS_ACCESS_KEY_ID:$AWS_SESSION_TOKEN:${PATH:+path}\""])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .unwrap();

        assert_eq!(String::from_utf8_lossy(&output.stdout), "ASIAEXAMPLE:token:path");
        assert_eq!(env::var_os("AWS_SESSION_TOKEN"), before);
    }

    #[test]
    fn spawn_failure_is_an_error() {
        let err = shell("/nonexistent/aws-identity-shell").run(true).unwrap_err();
        assert!(err.to_string().contains("Failed to spawn shell"), "{err}");
    }
}
