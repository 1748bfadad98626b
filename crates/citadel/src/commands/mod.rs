//! CLI command implementations

pub mod encrypt;
pub mod fingerprint;
pub mod get;

use anyhow::{Context, Result};
use camino::Utf8Path;
use citadel_core::{CitadelConfig, NodeAttributes};

/// Load node attributes with `CITADEL_*` environment overrides applied
pub(crate) fn load_attributes(config: Option<&Utf8Path>) -> Result<NodeAttributes> {
    let config =
        CitadelConfig::load_with_env(config).context("Failed to load citadel configuration")?;
    Ok(config.attributes)
}
