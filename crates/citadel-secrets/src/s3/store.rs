//! Secret store
//!
//! Combines credential resolution, the object fetcher and decryption into the
//! single lookup automation code calls.

use crate::credentials::{resolve_credentials, Credentials};
use crate::decrypt::decrypt;
use crate::error::{Error, Result};
use crate::s3::backend::{ObjectFetcher, S3Backend};
use crate::security::{AuditLog, EncryptionKey};
use citadel_core::NodeAttributes;
use tracing::{debug, info};

/// Read-only view of one bucket of secrets
///
/// A value of this type only exists once credentials have resolved; it holds
/// no mutable state and can be shared across tasks.
pub struct SecretStore<F: ObjectFetcher = S3Backend> {
    bucket: String,
    credentials: Credentials,
    encryption_key: Option<EncryptionKey>,
    fetcher: F,
}

impl SecretStore<S3Backend> {
    /// Create a store backed by S3, using the region and endpoint from
    /// `attributes`
    pub fn from_attributes(attributes: &NodeAttributes, bucket: Option<&str>) -> Result<Self> {
        let backend = S3Backend::new(
            attributes.citadel.region.clone(),
            attributes.citadel.endpoint.clone(),
        );
        Self::new(attributes, bucket, backend)
    }
}

impl<F: ObjectFetcher> SecretStore<F> {
    /// Create a store from node attributes
    ///
    /// `bucket` overrides `citadel.bucket`. Fails with
    /// [`Error::Configuration`] when there is no bucket, no usable
    /// credentials, or an unusable key setting.
    pub fn new(attributes: &NodeAttributes, bucket: Option<&str>, fetcher: F) -> Result<Self> {
        let bucket = bucket
            .or(attributes.citadel.bucket.as_deref())
            .filter(|b| !b.is_empty())
            .ok_or_else(|| Error::configuration("no bucket configured"))?
            .to_string();

        let credentials = resolve_credentials(attributes)?;
        let encryption_key = EncryptionKey::from_attributes(&attributes.citadel)?;

        info!(
            "Citadel store ready for bucket {} (decryption {})",
            bucket,
            if encryption_key.is_some() { "enabled" } else { "disabled" }
        );

        Ok(Self::with_components(bucket, credentials, encryption_key, fetcher))
    }

    /// Create a store with explicit components
    pub fn with_components(
        bucket: String,
        credentials: Credentials,
        encryption_key: Option<EncryptionKey>,
        fetcher: F,
    ) -> Self {
        Self {
            bucket,
            credentials,
            encryption_key,
            fetcher,
        }
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Get the resolved credentials
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Get the encryption key, if decryption is enabled
    pub fn encryption_key(&self) -> Option<&EncryptionKey> {
        self.encryption_key.as_ref()
    }

    /// Retrieve a secret
    ///
    /// 1. Fetch the object; fetch errors pass through unchanged
    /// 2. Without an encryption key, return the bytes as stored
    /// 3. Otherwise decrypt; failures carry the key name and key fingerprint
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        debug!("citadel: Retrieving {}/{}", self.bucket, key);

        let contents = match self.fetcher.fetch(&self.bucket, key, &self.credentials).await {
            Ok(contents) => contents,
            Err(e) => {
                AuditLog::new("fetch", key, &self.bucket)
                    .with_error(e.to_string())
                    .log();
                return Err(e.into());
            }
        };

        let Some(encryption_key) = &self.encryption_key else {
            AuditLog::new("fetch", key, &self.bucket).log();
            return Ok(contents);
        };

        match decrypt(&contents, encryption_key.as_bytes()) {
            Ok(plaintext) => {
                AuditLog::new("decrypt", key, &self.bucket).log();
                Ok(plaintext)
            }
            Err(source) => {
                let err = Error::Decrypt {
                    key: key.to_string(),
                    fingerprint: encryption_key.fingerprint(),
                    source,
                };
                AuditLog::new("decrypt", key, &self.bucket)
                    .with_error(err.to_string())
                    .log();
                Err(err)
            }
        }
    }
}

impl<F: ObjectFetcher> std::fmt::Debug for SecretStore<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore")
            .field("bucket", &self.bucket)
            .field("credentials", &self.credentials)
            .field("encryption_key", &self.encryption_key)
            .finish_non_exhaustive()
    }
}
