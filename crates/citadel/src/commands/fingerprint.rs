//! `citadel fingerprint`

use anyhow::{anyhow, Result};
use camino::Utf8Path;
use citadel_secrets::EncryptionKey;

pub fn run(config: Option<&Utf8Path>) -> Result<()> {
    let attributes = super::load_attributes(config)?;
    let key = EncryptionKey::from_attributes(&attributes.citadel)?.ok_or_else(|| {
        anyhow!("No encryption key configured (citadel.encryption_key or citadel.encryption_key_base64)")
    })?;

    println!("{}", key.fingerprint());
    Ok(())
}
