//! S3 backend for secret retrieval
//!
//! Supports AWS S3 and S3-compatible storage (MinIO, Wasabi, DigitalOcean Spaces).
//! The SDK client is built once per set of credentials and reused for every
//! fetch; objects themselves are never cached.

use crate::credentials::Credentials;
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials as AwsCredentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use citadel_core::types::DEFAULT_REGION;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

/// Provider name attached to credentials handed to the SDK
const CREDENTIALS_PROVIDER: &str = "citadel";

/// Object retrieval failures
#[derive(Error, Debug)]
pub enum FetchError {
    /// No object under this key
    #[error("Secret not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Request failed (auth, network, service error)
    #[error("Failed to get secret s3://{bucket}/{key}: {message}")]
    Request {
        bucket: String,
        key: String,
        message: String,
    },

    /// Response body could not be read
    #[error("Failed to read response body for s3://{bucket}/{key}: {message}")]
    Body {
        bucket: String,
        key: String,
        message: String,
    },
}

/// Retrieves raw object bytes from a bucket
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    /// Fetch the object at `bucket`/`key` using `credentials`
    async fn fetch(
        &self,
        bucket: &str,
        key: &str,
        credentials: &Credentials,
    ) -> Result<Vec<u8>, FetchError>;
}

/// S3 object fetcher
pub struct S3Backend {
    /// AWS region
    region: String,
    /// Custom S3-compatible endpoint
    endpoint: Option<String>,
    /// Client for the most recently used credentials
    client: RwLock<Option<(Credentials, Client)>>,
    /// Number of SDK clients built so far
    clients_built: AtomicUsize,
}

impl Default for S3Backend {
    fn default() -> Self {
        Self::new(DEFAULT_REGION, None)
    }
}

impl S3Backend {
    pub fn new(region: impl Into<String>, endpoint: Option<String>) -> Self {
        Self {
            region: region.into(),
            endpoint,
            client: RwLock::new(None),
            clients_built: AtomicUsize::new(0),
        }
    }

    /// Get the region
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Get the custom endpoint, if any
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Return the client for `credentials`, building it on first use
    ///
    /// A store always fetches with the same credentials, so in practice one
    /// client serves every lookup. Different credentials replace the cached
    /// client.
    fn client(&self, credentials: &Credentials) -> Client {
        if let Ok(cached) = self.client.read() {
            if let Some((cached_for, client)) = cached.as_ref() {
                if cached_for == credentials {
                    return client.clone();
                }
            }
        }

        match self.client.write() {
            Ok(mut cached) => {
                if let Some((cached_for, client)) = cached.as_ref() {
                    if cached_for == credentials {
                        return client.clone();
                    }
                }
                let client = self.create_client(credentials);
                *cached = Some((credentials.clone(), client.clone()));
                client
            }
            // A poisoned cache only costs a rebuild
            Err(_) => self.create_client(credentials),
        }
    }

    /// Create an S3 client bound to `credentials`
    ///
    /// The ambient AWS credential chain is not consulted.
    fn create_client(&self, credentials: &Credentials) -> Client {
        let aws_credentials = AwsCredentials::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            credentials.session_token().map(str::to_string),
            None,
            CREDENTIALS_PROVIDER,
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(aws_credentials);

        // Configure custom endpoint for S3-compatible storage
        if let Some(endpoint_url) = &self.endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint_url);
            builder = builder
                .endpoint_url(endpoint_url)
                .force_path_style(true); // Required for MinIO and many S3-compatible services
        }

        self.clients_built.fetch_add(1, Ordering::Relaxed);
        debug!("Created S3 client for region {}", self.region);
        Client::from_conf(builder.build())
    }

    #[cfg(test)]
    fn clients_built(&self) -> usize {
        self.clients_built.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Backend")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ObjectFetcher for S3Backend {
    async fn fetch(
        &self,
        bucket: &str,
        key: &str,
        credentials: &Credentials,
    ) -> Result<Vec<u8>, FetchError> {
        let client = self.client(credentials);
        debug!("Downloading secret: s3://{}/{}", bucket, key);

        let resp = match client.get_object().bucket(bucket).key(key).send().await {
            Ok(resp) => resp,
            Err(e) => {
                let message = DisplayErrorContext(&e).to_string();
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    return Err(FetchError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    });
                }
                return Err(FetchError::Request {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    message,
                });
            }
        };

        let body = resp.body.collect().await.map_err(|e| FetchError::Body {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let data = body.into_bytes().to_vec();
        debug!("Downloaded {} bytes from s3://{}/{}", data.len(), bucket, key);

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_defaults() {
        let backend = S3Backend::default();
        assert_eq!(backend.region(), "us-east-1");
        assert!(backend.endpoint().is_none());
    }

    #[test]
    fn test_fetch_error_messages() {
        let err = FetchError::NotFound {
            bucket: "ops-secrets".to_string(),
            key: "db/password".to_string(),
        };
        assert_eq!(err.to_string(), "Secret not found: s3://ops-secrets/db/password");

        let err = FetchError::Request {
            bucket: "ops-secrets".to_string(),
            key: "db/password".to_string(),
            message: "AccessDenied".to_string(),
        };
        assert!(err.to_string().ends_with("AccessDenied"));
    }

    #[tokio::test]
    async fn test_client_reused_across_fetches() {
        let backend = S3Backend::new("eu-west-1", Some("http://127.0.0.1:9000".to_string()));
        let creds = Credentials::new("AKIA", "secret", None).unwrap();

        let first = backend.client(&creds);
        let second = backend.client(&creds);

        assert_eq!(backend.clients_built(), 1);
        assert_eq!(first.config().region(), second.config().region());
    }

    #[tokio::test]
    async fn test_client_rebuilt_for_new_credentials() {
        let backend = S3Backend::default();
        let first = Credentials::new("AKIAFIRST", "secret", None).unwrap();
        let second = Credentials::new("AKIASECOND", "secret", None).unwrap();

        backend.client(&first);
        backend.client(&second);
        backend.client(&second);

        assert_eq!(backend.clients_built(), 2);
    }

    #[test]
    fn test_backend_debug_omits_client() {
        let backend = S3Backend::new("eu-west-1", None);
        let debug = format!("{:?}", backend);

        assert!(debug.contains("eu-west-1"));
        assert!(!debug.contains("client"));
    }

    #[tokio::test]
    async fn test_mock_fetcher() {
        let mut fetcher = MockObjectFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|bucket, key, creds| {
                bucket == "ops-secrets" && key == "api/key" && creds.access_key_id() == "AKIA"
            })
            .returning(|_, _, _| Ok(b"value".to_vec()));

        let creds = Credentials::new("AKIA", "secret", None).unwrap();
        let data = fetcher.fetch("ops-secrets", "api/key", &creds).await.unwrap();
        assert_eq!(data, b"value");
    }
}
