//! Core library for Citadel
//!
//! Holds the node attribute types that describe where secrets live and how to
//! authenticate against the bucket, plus the loader that reads them from disk.

pub mod config;
pub mod error;
pub mod types;

pub use config::CitadelConfig;
pub use error::{Error, Result};
pub use types::{CitadelAttributes, Ec2Attributes, IamAttributes, NodeAttributes, RoleCredentials};
