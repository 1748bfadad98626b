//! Access credential resolution
//!
//! Precedence (highest to lowest):
//! 1. Explicit `citadel.access_key_id` / `citadel.secret_access_key`
//! 2. IAM role credentials from `ec2.iam.security-credentials`
//!
//! Instance metadata is expected to be collected already; nothing here talks
//! to the network.

use crate::error::{Error, Result};
use crate::security::SecureString;
use citadel_core::NodeAttributes;
use std::fmt;
use tracing::{info, warn};

/// Access credentials for the secrets bucket
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: SecureString,
    session_token: Option<SecureString>,
}

impl Credentials {
    /// Build credentials, rejecting an empty key ID or secret
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<SecureString>,
        session_token: Option<SecureString>,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let secret_access_key = secret_access_key.into();

        if access_key_id.is_empty() {
            return Err(Error::configuration("access key ID is empty"));
        }
        if secret_access_key.is_empty() {
            return Err(Error::configuration(format!(
                "secret access key for {} is empty",
                access_key_id
            )));
        }

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        self.secret_access_key.as_str()
    }

    /// Session token, present for temporary role credentials
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_ref().map(SecureString::as_str)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key)
            .field("session_token", &self.session_token)
            .finish()
    }
}

/// Derive credentials from node attributes
///
/// When several IAM roles are attached the lexicographically first role name
/// wins.
pub fn resolve_credentials(attributes: &NodeAttributes) -> Result<Credentials> {
    let citadel = &attributes.citadel;

    if let Some(access_key_id) = citadel.access_key_id.as_deref().filter(|id| !id.is_empty()) {
        let secret = citadel.secret_access_key.as_deref().unwrap_or_default();
        let credentials = Credentials::new(access_key_id, secret, None)?;
        info!("Using explicitly configured S3 credentials ({})", access_key_id);
        return Ok(credentials);
    }

    if let Some(roles) = attributes.security_credentials() {
        if let Some((role_name, role)) = roles.iter().next() {
            if roles.len() > 1 {
                warn!(
                    "{} IAM roles attached, using {} (first by name)",
                    roles.len(),
                    role_name
                );
            }

            let token = role.token.as_deref().map(SecureString::from);
            let credentials = Credentials::new(
                role.access_key_id.as_str(),
                role.secret_access_key.as_str(),
                token,
            )
            .map_err(|e| match e {
                Error::Configuration { message } => {
                    Error::configuration(format!("IAM role {}: {}", role_name, message))
                }
                other => other,
            })?;
            info!("Using S3 credentials from IAM role {}", role_name);
            return Ok(credentials);
        }
    }

    Err(Error::configuration("no S3 credentials found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(yaml: &str) -> NodeAttributes {
        NodeAttributes::from_yaml(yaml).unwrap()
    }

    const ROLE_YAML: &str = r#"
ec2:
  iam:
    security-credentials:
      app-role:
        AccessKeyId: ASIAROLE
        SecretAccessKey: role-secret
        Token: role-token
"#;

    #[test]
    fn test_explicit_credentials() {
        let creds = resolve_credentials(&attrs(
            "citadel:\n  access_key_id: AKIAEXPLICIT\n  secret_access_key: explicit-secret\n",
        ))
        .unwrap();

        assert_eq!(creds.access_key_id(), "AKIAEXPLICIT");
        assert_eq!(creds.secret_access_key(), "explicit-secret");
        assert_eq!(creds.session_token(), None);
    }

    #[test]
    fn test_explicit_wins_over_role() {
        let yaml = format!(
            "citadel:\n  access_key_id: AKIAEXPLICIT\n  secret_access_key: explicit-secret\n{}",
            ROLE_YAML
        );
        let creds = resolve_credentials(&attrs(&yaml)).unwrap();

        assert_eq!(creds.access_key_id(), "AKIAEXPLICIT");
        assert_eq!(creds.session_token(), None);
    }

    #[test]
    fn test_role_credentials() {
        let creds = resolve_credentials(&attrs(ROLE_YAML)).unwrap();

        assert_eq!(creds.access_key_id(), "ASIAROLE");
        assert_eq!(creds.secret_access_key(), "role-secret");
        assert_eq!(creds.session_token(), Some("role-token"));
    }

    #[test]
    fn test_empty_access_key_falls_back_to_role() {
        let yaml = format!("citadel:\n  access_key_id: \"\"\n{}", ROLE_YAML);
        let creds = resolve_credentials(&attrs(&yaml)).unwrap();

        assert_eq!(creds.access_key_id(), "ASIAROLE");
    }

    #[test]
    fn test_multiple_roles_pick_first_by_name() {
        let yaml = r#"
ec2:
  iam:
    security-credentials:
      zeta-role:
        AccessKeyId: ASIAZETA
        SecretAccessKey: zeta-secret
      alpha-role:
        AccessKeyId: ASIAALPHA
        SecretAccessKey: alpha-secret
"#;
        let creds = resolve_credentials(&attrs(yaml)).unwrap();

        assert_eq!(creds.access_key_id(), "ASIAALPHA");
        assert_eq!(creds.session_token(), None);
    }

    #[test]
    fn test_no_credentials() {
        let err = resolve_credentials(&attrs("citadel:\n  bucket: b\n")).unwrap_err();

        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("no S3 credentials found"));
    }

    #[test]
    fn test_empty_role_map() {
        let err =
            resolve_credentials(&attrs("ec2:\n  iam:\n    security-credentials: {}\n")).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_null_role_map() {
        let err = resolve_credentials(&attrs("ec2:\n  iam:\n    security-credentials: null\n"))
            .unwrap_err();

        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("no S3 credentials found"));
    }

    #[test]
    fn test_explicit_without_secret() {
        let err = resolve_credentials(&attrs("citadel:\n  access_key_id: AKIAONLY\n")).unwrap_err();

        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("AKIAONLY"));
    }

    #[test]
    fn test_role_with_empty_secret() {
        let yaml = r#"
ec2:
  iam:
    security-credentials:
      broken-role:
        AccessKeyId: ASIABROKEN
        SecretAccessKey: ""
"#;
        let err = resolve_credentials(&attrs(yaml)).unwrap_err();
        assert!(err.to_string().contains("broken-role"));
    }

    #[test]
    fn test_debug_redacts() {
        let creds = resolve_credentials(&attrs(ROLE_YAML)).unwrap();
        let debug = format!("{:?}", creds);

        assert!(debug.contains("ASIAROLE"));
        assert!(!debug.contains("role-secret"));
        assert!(!debug.contains("role-token"));
    }
}
