//! Caller identity ARN parsing and IAM ARN construction.

use std::fmt;

use anyhow::{Context, Result, ensure};

/// The caller's ARN as reported by `GetCallerIdentity`.
///
/// Shape: `arn:partition:service:region:account:resource-type/resource-name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerArn {
    arn: String,
    account: String,
    principal: String,
}

impl CallerArn {
    /// Parses a caller ARN, failing on anything that is not six colon-separated
    /// fields whose last field is `type/name`.
    ///
    /// The principal name is everything after the first `/`, so an assumed-role
    /// ARN yields `role-name/session-name`.
    pub fn parse(arn: &str) -> Result<Self> {
        let fields: Vec<&str> = arn.split(':').collect();
        ensure!(
            fields.len() == 6,
            "Malformed caller ARN '{arn}': expected 6 colon-separated fields, found {}",
            fields.len()
        );

        let account = fields[4];
        ensure!(!account.is_empty(), "Malformed caller ARN '{arn}': empty account");

        let (_, principal) = fields[5]
            .split_once('/')
            .with_context(|| format!("Malformed caller ARN '{arn}': resource has no '/'"))?;
        ensure!(
            !principal.is_empty(),
            "Malformed caller ARN '{arn}': empty principal name"
        );

        Ok(Self {
            arn: arn.to_string(),
            account: account.to_string(),
            principal: principal.to_string(),
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }
}

impl fmt::Display for CallerArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.arn)
    }
}

pub fn role_arn(account: &str, role: &str) -> String {
    format!("arn:aws:iam::{account}:role/{role}")
}

pub fn mfa_serial(account: &str, name: &str) -> String {
    format!("arn:aws:iam::{account}:mfa/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_arn() {
        let arn = CallerArn::parse("arn:aws:iam::111122223333:user/alice").unwrap();
        assert_eq!(arn.account(), "111122223333");
        assert_eq!(arn.principal(), "alice");
        assert_eq!(arn.to_string(), "arn:aws:iam::111122223333:user/alice");
    }

    #[test]
    fn principal_keeps_everything_after_first_slash() {
        let arn =
            CallerArn::parse("arn:aws:sts::111122223333:assumed-role/Admin/alice").unwrap();
        assert_eq!(arn.principal(), "Admin/alice");
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = CallerArn::parse("arn:aws:iam:111122223333:user/alice").unwrap_err();
        assert!(err.to_string().contains("expected 6"), "{err}");

        assert!(CallerArn::parse("arn:aws:iam::1111:22223333:user/alice").is_err());
        assert!(CallerArn::parse("").is_err());
    }

    #[test]
    fn rejects_resource_without_slash() {
        let err = CallerArn::parse("arn:aws:iam::111122223333:root").unwrap_err();
        assert!(err.to_string().contains("no '/'"), "{err}");
    }

    #[test]
    fn rejects_empty_account_or_principal() {
        assert!(CallerArn::parse("arn:aws:iam:::user/alice").is_err());
        assert!(CallerArn::parse("arn:aws:iam::111122223333:user/").is_err());
    }

    #[test]
    fn builds_iam_arns() {
        assert_eq!(
            role_arn("111122223333", "deploy"),
            "arn:aws:iam::111122223333:role/deploy"
        );
        assert_eq!(
            mfa_serial("111122223333", "alice"),
            "arn:aws:iam::111122223333:mfa/alice"
        );
    }
}
