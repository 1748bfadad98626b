//! Node attribute types
//!
//! These mirror the attribute tree an automation run hands to Citadel: a
//! `citadel` section with bucket and key settings, and the `ec2` section an
//! instance-metadata collector fills in with IAM role credentials.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default AWS region for the secrets bucket
pub const DEFAULT_REGION: &str = "us-east-1";

/// Root of the attribute tree
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// Citadel settings
    #[serde(default, deserialize_with = "null_as_default")]
    pub citadel: CitadelAttributes,

    /// Instance metadata, present on EC2 hosts
    #[serde(default)]
    pub ec2: Option<Ec2Attributes>,
}

impl NodeAttributes {
    /// Parse attributes from a YAML document
    pub fn from_yaml(content: &str) -> crate::Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    /// Parse attributes from a JSON document
    pub fn from_json(content: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// IAM role credentials published by the instance metadata service, if any
    pub fn security_credentials(&self) -> Option<&BTreeMap<String, RoleCredentials>> {
        self.ec2
            .as_ref()
            .and_then(|ec2| ec2.iam.as_ref())
            .map(|iam| &iam.security_credentials)
    }
}

/// The `citadel` attribute section
#[derive(Clone, Serialize, Deserialize)]
pub struct CitadelAttributes {
    /// Bucket holding the secrets
    #[serde(default)]
    pub bucket: Option<String>,

    /// AWS region of the bucket
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom S3-compatible endpoint (optional)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Symmetric key used to decrypt stored objects; its UTF-8 bytes are the
    /// key
    #[serde(default)]
    pub encryption_key: Option<String>,

    /// The same key as standard base64, for keys that are not valid UTF-8.
    /// Setting both this and `encryption_key` is a configuration error.
    #[serde(default)]
    pub encryption_key_base64: Option<String>,

    /// Explicit access key ID
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Explicit secret access key
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl Default for CitadelAttributes {
    fn default() -> Self {
        Self {
            bucket: None,
            region: default_region(),
            endpoint: None,
            encryption_key: None,
            encryption_key_base64: None,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

impl fmt::Debug for CitadelAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CitadelAttributes")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("encryption_key", &redacted(&self.encryption_key))
            .field(
                "encryption_key_base64",
                &redacted(&self.encryption_key_base64),
            )
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redacted(&self.secret_access_key))
            .finish()
    }
}

/// The `ec2` attribute section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ec2Attributes {
    #[serde(default)]
    pub iam: Option<IamAttributes>,
}

/// The `ec2.iam` attribute section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IamAttributes {
    /// Role name to temporary credentials. Ordered by role name.
    ///
    /// Metadata collectors write `null` when no role is attached; that reads
    /// as an empty map.
    #[serde(
        rename = "security-credentials",
        default,
        deserialize_with = "null_as_default"
    )]
    pub security_credentials: BTreeMap<String, RoleCredentials>,
}

/// Temporary credentials for one IAM role, as served by instance metadata
#[derive(Clone, Serialize, Deserialize)]
pub struct RoleCredentials {
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,

    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,

    #[serde(rename = "Token", default)]
    pub token: Option<String>,
}

impl fmt::Debug for RoleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("token", &redacted(&self.token))
            .finish()
    }
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn redacted(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "[REDACTED]")
}
