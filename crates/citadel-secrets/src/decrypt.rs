//! Secret decryption
//!
//! Stored secrets are base64 text of AES-256-CBC ciphertext with PKCS#7
//! padding. The format carries no IV: encryption and decryption both use an
//! all-zero IV, matching
//! `openssl enc -aes-256-cbc -a -K <hex key> -iv 0`.
//!
//! This is kept for compatibility with objects already in the bucket. A zero
//! IV leaks equality of plaintext prefixes and there is no authentication tag,
//! so a tampered object is only caught if the padding happens to break.

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use thiserror::Error;

type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;

/// Size of the cipher key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// AES block size in bytes
const BLOCK_SIZE: usize = 16;

const ZERO_IV: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

/// The key is not exactly [`KEY_SIZE`] bytes
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("key must be {KEY_SIZE} bytes, got {len} bytes")]
pub struct KeyLengthError {
    pub len: usize,
}

/// Decryption failures
#[derive(Error, Debug)]
pub enum DecryptError {
    /// Stored object is not valid base64
    #[error("Unable to decrypt: invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Key has the wrong length for AES-256
    #[error("Unable to decrypt: {0}")]
    KeyLength(#[from] KeyLengthError),

    /// Block cipher or padding failure
    #[error("Unable to decrypt: {message}")]
    Cipher { message: String },
}

/// Decode and decrypt a stored secret
///
/// ASCII whitespace in the input is skipped, so line-wrapped base64 as
/// written by `openssl enc -a` decodes as-is.
pub fn decrypt(ciphertext_b64: impl AsRef<[u8]>, key: &[u8]) -> Result<Vec<u8>, DecryptError> {
    let encoded: Vec<u8> = ciphertext_b64
        .as_ref()
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let ciphertext = BASE64.decode(&encoded)?;

    let cipher = Aes256CbcDec::new_from_slices(key, &ZERO_IV)
        .map_err(|_| KeyLengthError { len: key.len() })?;

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(DecryptError::Cipher {
            message: format!(
                "wrong final block length: {} bytes is not a positive multiple of {}",
                ciphertext.len(),
                BLOCK_SIZE
            ),
        });
    }

    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|e| DecryptError::Cipher {
            message: format!("bad decrypt: {}", e),
        })
}

/// Encrypt a secret into the stored format
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<String, KeyLengthError> {
    let cipher = Aes256CbcEnc::new_from_slices(key, &ZERO_IV)
        .map_err(|_| KeyLengthError { len: key.len() })?;

    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
    Ok(BASE64.encode(ciphertext))
}
