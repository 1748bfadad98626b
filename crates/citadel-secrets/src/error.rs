//! Error types for citadel-secrets

use crate::decrypt::DecryptError;
use crate::s3::FetchError;
use thiserror::Error;

/// Result type alias using citadel-secrets's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Secret retrieval errors
#[derive(Error, Debug)]
pub enum Error {
    /// No usable credentials or bucket; the store cannot be built
    #[error("Unable to load secrets from S3, {message}")]
    Configuration { message: String },

    /// Raised by the object fetcher, passed through untouched
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Fetched object could not be decrypted
    #[error(
        "Failed to decrypt S3 key {key} (using encryption key with an MD5 starting with {fingerprint}): {source}"
    )]
    Decrypt {
        key: String,
        fingerprint: String,
        source: DecryptError,
    },
}

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
