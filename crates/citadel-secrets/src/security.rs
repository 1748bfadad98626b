//! Security utilities for secret retrieval
//!
//! Provides:
//! - SecureString and EncryptionKey, zeroed on drop and redacted in Debug
//! - Key fingerprints for error messages
//! - Audit logging (never logs secret values)

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use citadel_core::CitadelAttributes;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Number of hex characters of the key's MD5 digest shown to operators
pub const FINGERPRINT_LEN: usize = 6;

/// A secure string that is automatically zeroed on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    /// Create a new secure string
    pub fn new(value: String) -> Self {
        Self { inner: value }
    }

    /// Get the string value (use with caution)
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Get length
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString([REDACTED {} bytes])", self.len())
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Symmetric key used to decrypt stored objects
///
/// The bytes are used as-is as the cipher key; no derivation is applied.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: Vec<u8>,
}

impl EncryptionKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// First six hex characters of the key's MD5 digest
    ///
    /// Identifies which key was in use without revealing it.
    pub fn fingerprint(&self) -> String {
        let digest = format!("{:x}", md5::compute(&self.bytes));
        digest[..FINGERPRINT_LEN].to_string()
    }

    /// Decode a standard base64 key, for keys that are not valid UTF-8
    pub fn from_base64(encoded: &str) -> std::result::Result<Self, base64::DecodeError> {
        BASE64.decode(encoded.trim()).map(Self::new)
    }

    /// The key configured in the `citadel` section, if any
    ///
    /// `encryption_key` supplies the key's UTF-8 bytes, `encryption_key_base64`
    /// its base64 encoding. At most one of the two may be set.
    pub fn from_attributes(citadel: &CitadelAttributes) -> Result<Option<Self>> {
        match (&citadel.encryption_key, &citadel.encryption_key_base64) {
            (Some(_), Some(_)) => Err(Error::configuration(
                "both encryption_key and encryption_key_base64 are set",
            )),
            (Some(key), None) => Ok(Some(Self::from(key.as_str()))),
            (None, Some(encoded)) => Self::from_base64(encoded).map(Some).map_err(|e| {
                Error::configuration(format!("encryption_key_base64 is not valid base64: {}", e))
            }),
            (None, None) => Ok(None),
        }
    }
}

impl From<&str> for EncryptionKey {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for EncryptionKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EncryptionKey([REDACTED {} bytes, md5 {}])",
            self.len(),
            self.fingerprint()
        )
    }
}

/// Audit log entry for secret retrieval
#[derive(Debug, Clone)]
pub struct AuditLog {
    pub operation: &'static str,
    pub secret_name: String,
    pub bucket: String,
    pub success: bool,
    pub error: Option<String>,
}

impl AuditLog {
    pub fn new(operation: &'static str, secret_name: &str, bucket: &str) -> Self {
        Self {
            operation,
            secret_name: secret_name.to_string(),
            bucket: bucket.to_string(),
            success: true,
            error: None,
        }
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.success = false;
        self.error = Some(error);
        self
    }

    /// Log the audit entry (never logs secret values)
    pub fn log(&self) {
        if self.success {
            tracing::debug!(
                operation = self.operation,
                secret_name = %self.secret_name,
                bucket = %self.bucket,
                "Secret operation successful"
            );
        } else {
            tracing::warn!(
                operation = self.operation,
                secret_name = %self.secret_name,
                bucket = %self.bucket,
                error = ?self.error,
                "Secret operation failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_string_debug() {
        let secure = SecureString::new("secret".to_string());
        let debug_str = format!("{:?}", secure);

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("secret"));
    }

    #[test]
    fn test_secure_string_display() {
        let secure = SecureString::new("secret".to_string());
        assert_eq!(format!("{}", secure), "[REDACTED]");
    }

    #[test]
    fn test_fingerprint_of_zero_key() {
        let key = EncryptionKey::new(vec![0u8; 32]);
        assert_eq!(key.fingerprint(), "70bc8f");
    }

    #[test]
    fn test_fingerprint_of_ascii_key() {
        let key = EncryptionKey::from("0123456789abcdef0123456789abcdef");
        assert_eq!(key.fingerprint(), "8516ac");
        assert_eq!(key.fingerprint().len(), FINGERPRINT_LEN);
    }

    #[test]
    fn test_encryption_key_debug() {
        let key = EncryptionKey::from("0123456789abcdef0123456789abcdef");
        let debug_str = format!("{:?}", key);

        assert!(debug_str.contains("REDACTED 32 bytes"));
        assert!(debug_str.contains("8516ac"));
        assert!(!debug_str.contains("0123456789abcdef"));
    }

    #[test]
    fn test_base64_key_allows_non_utf8_bytes() {
        let mut citadel = CitadelAttributes::default();
        citadel.encryption_key_base64 = Some("/wD/AA==\n".to_string());

        let key = EncryptionKey::from_attributes(&citadel).unwrap().unwrap();
        assert_eq!(key.as_bytes(), &[0xff, 0x00, 0xff, 0x00]);
    }

    #[test]
    fn test_key_from_attributes() {
        let mut citadel = CitadelAttributes::default();
        assert!(EncryptionKey::from_attributes(&citadel).unwrap().is_none());

        citadel.encryption_key = Some("0123456789abcdef0123456789abcdef".to_string());
        let key = EncryptionKey::from_attributes(&citadel).unwrap().unwrap();
        assert_eq!(key.fingerprint(), "8516ac");

        citadel.encryption_key_base64 = Some("AAAA".to_string());
        let err = EncryptionKey::from_attributes(&citadel).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_invalid_base64_key_is_configuration_error() {
        let mut citadel = CitadelAttributes::default();
        citadel.encryption_key_base64 = Some("not base64!".to_string());

        let err = EncryptionKey::from_attributes(&citadel).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("encryption_key_base64"));
    }

    #[test]
    fn test_audit_log_error() {
        let log = AuditLog::new("get", "db/password", "ops-secrets")
            .with_error("Object not found".to_string());

        assert!(!log.success);
        assert_eq!(log.error.as_deref(), Some("Object not found"));
        assert_eq!(log.bucket, "ops-secrets");
    }
}
