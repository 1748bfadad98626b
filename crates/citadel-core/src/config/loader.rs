//! Configuration file loading and parsing

use crate::error::{Error, Result};
use crate::types::NodeAttributes;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::debug;

/// Configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &["citadel.yaml", "citadel.yml", "citadel.json"];

/// Environment variables that override `citadel` attributes after loading
const ENV_BUCKET: &str = "CITADEL_BUCKET";
const ENV_REGION: &str = "CITADEL_REGION";
const ENV_ENDPOINT: &str = "CITADEL_ENDPOINT";
const ENV_ENCRYPTION_KEY: &str = "CITADEL_ENCRYPTION_KEY";
const ENV_ENCRYPTION_KEY_BASE64: &str = "CITADEL_ENCRYPTION_KEY_BASE64";
const ENV_ACCESS_KEY_ID: &str = "CITADEL_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "CITADEL_SECRET_ACCESS_KEY";

/// Loaded Citadel configuration
#[derive(Debug, Clone)]
pub struct CitadelConfig {
    /// The parsed attributes
    pub attributes: NodeAttributes,

    /// Path the attributes were read from
    pub config_path: Utf8PathBuf,
}

impl CitadelConfig {
    /// Load configuration from the specified path or search for it
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let (config_path, content) = if let Some(p) = path {
            let content = fs::read_to_string(p).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::config_not_found(p.as_str())
                } else {
                    Error::Io(e)
                }
            })?;
            (p.to_owned(), content)
        } else {
            Self::find_config()?
        };

        debug!("Loading citadel configuration from {}", config_path);
        let attributes = Self::parse(&config_path, &content)?;

        Ok(Self {
            attributes,
            config_path,
        })
    }

    /// Load configuration and apply `CITADEL_*` environment overrides
    pub fn load_with_env(path: Option<&Utf8Path>) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse by extension: `.json` is JSON, anything else YAML
    fn parse(path: &Utf8Path, content: &str) -> Result<NodeAttributes> {
        match path.extension() {
            Some("json") => NodeAttributes::from_json(content),
            _ => NodeAttributes::from_yaml(content),
        }
    }

    /// Overwrite `citadel` attributes with values from `lookup`
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// clear a configured setting.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let citadel = &mut self.attributes.citadel;

        if let Some(bucket) = get(ENV_BUCKET) {
            citadel.bucket = Some(bucket);
        }
        if let Some(region) = get(ENV_REGION) {
            citadel.region = region;
        }
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            citadel.endpoint = Some(endpoint);
        }
        // Either key variable replaces whichever key form the file set
        let key = get(ENV_ENCRYPTION_KEY);
        let key_base64 = get(ENV_ENCRYPTION_KEY_BASE64);
        if key.is_some() || key_base64.is_some() {
            citadel.encryption_key = key;
            citadel.encryption_key_base64 = key_base64;
        }
        if let Some(id) = get(ENV_ACCESS_KEY_ID) {
            citadel.access_key_id = Some(id);
        }
        if let Some(secret) = get(ENV_SECRET_ACCESS_KEY) {
            citadel.secret_access_key = Some(secret);
        }
    }

    /// Find configuration file in current directory or parent directories
    fn find_config() -> Result<(Utf8PathBuf, String)> {
        let cwd = std::env::current_dir().map_err(Error::Io)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;

        let mut current = cwd.as_path();

        loop {
            for name in CONFIG_FILE_NAMES {
                let path = current.join(name);
                if path.exists() {
                    let content = fs::read_to_string(&path)?;
                    return Ok((path, content));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::config_not_found(
            "citadel.yaml (searched current and parent directories)",
        ))
    }
}
