//! Secret retrieval for Citadel
//!
//! Fetches objects from an S3 bucket and, when an encryption key is
//! configured, decrypts them before handing them back:
//! - **Credentials**: explicit keys or EC2 instance-role credentials
//! - **Decryption**: AES-256-CBC with PKCS#7 padding over base64 ciphertext
//! - **Diagnostics**: failures name the secret and an MD5 fingerprint of the
//!   key, never the key itself

pub mod credentials;
pub mod decrypt;
pub mod error;
pub mod s3;
pub mod security;

pub use credentials::{resolve_credentials, Credentials};
pub use decrypt::{decrypt, encrypt, DecryptError, KeyLengthError};
pub use error::{Error, Result};
pub use s3::{FetchError, ObjectFetcher, S3Backend, SecretStore};
pub use security::{AuditLog, EncryptionKey, SecureString};

use citadel_core::NodeAttributes;

/// Build a store for `bucket` (or the configured bucket) backed by S3
///
/// This is the entry point automation code calls and then passes the store
/// to whatever needs secrets.
pub fn new_store(attributes: &NodeAttributes, bucket: Option<&str>) -> Result<SecretStore> {
    SecretStore::from_attributes(attributes, bucket)
}
