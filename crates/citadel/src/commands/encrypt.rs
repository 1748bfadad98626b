//! `citadel encrypt`
//!
//! Produces the base64 ciphertext to upload as an object, using the
//! configured encryption key.

use anyhow::{anyhow, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use citadel_secrets::EncryptionKey;
use clap::Args;
use std::io::Read;

#[derive(Args, Debug)]
pub struct EncryptArgs {
    /// Read the plaintext from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<Utf8PathBuf>,
}

pub fn run(args: EncryptArgs, config: Option<&Utf8Path>) -> Result<()> {
    let attributes = super::load_attributes(config)?;
    let key = EncryptionKey::from_attributes(&attributes.citadel)?.ok_or_else(|| {
        anyhow!("No encryption key configured (citadel.encryption_key or citadel.encryption_key_base64)")
    })?;

    let plaintext = read_input(args.input.as_deref())?;
    let ciphertext = citadel_secrets::encrypt(&plaintext, key.as_bytes())
        .context("Failed to encrypt input")?;

    println!("{}", ciphertext);
    Ok(())
}

fn read_input(path: Option<&Utf8Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path).with_context(|| format!("Failed to read {}", path)),
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_input_from_file() {
        let dir = tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("plain.txt")).unwrap();
        std::fs::write(&path, b"value").unwrap();

        assert_eq!(read_input(Some(path.as_path())).unwrap(), b"value");
    }

    #[test]
    fn test_read_input_missing_file() {
        let err = read_input(Some(Utf8Path::new("/nonexistent/plain.txt"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/plain.txt"));
    }
}
