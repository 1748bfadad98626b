//! S3-backed secret retrieval
//!
//! ## Architecture
//!
//! - `ObjectFetcher` is the seam to object storage; `S3Backend` implements it
//!   over `aws-sdk-s3`.
//! - `SecretStore` resolves credentials once at construction, then for each
//!   lookup fetches the object and decrypts it when a key is configured.
//!
//! ## Usage
//!
//! ```ignore
//! use citadel_core::CitadelConfig;
//! use citadel_secrets::s3::SecretStore;
//!
//! let config = CitadelConfig::load(None)?;
//! let store = SecretStore::from_attributes(&config.attributes, None)?;
//! let password = store.get("db/password").await?;
//! ```

pub mod backend;
pub mod store;

pub use backend::{FetchError, ObjectFetcher, S3Backend};
pub use store::SecretStore;
