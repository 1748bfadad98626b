//! `citadel get`

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use std::io::Write;

use crate::output;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Object key of the secret
    pub key: String,

    /// Bucket to read from (default: citadel.bucket)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Write the secret to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,
}

pub async fn run(args: GetArgs, config: Option<&Utf8Path>) -> Result<()> {
    let attributes = super::load_attributes(config)?;
    let store = citadel_secrets::new_store(&attributes, args.bucket.as_deref())?;

    let secret = store.get(&args.key).await?;
    write_secret(args.output.as_deref(), &secret)?;

    if let Some(path) = &args.output {
        output::success(&format!("Wrote {} to {}", args.key, path));
        output::kv("bytes", &secret.len().to_string());
    }
    Ok(())
}

/// Write to `path` with owner-only permissions, or to stdout
fn write_secret(path: Option<&Utf8Path>, secret: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            let mut options = std::fs::OpenOptions::new();
            options.create(true).write(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }

            let mut file = options
                .open(path)
                .with_context(|| format!("Failed to open {}", path))?;

            // `mode` only applies on creation; tighten an existing file before
            // any secret bytes land in it
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                file.set_permissions(std::fs::Permissions::from_mode(0o600))
                    .with_context(|| format!("Failed to set permissions on {}", path))?;
            }

            file.write_all(secret)
                .with_context(|| format!("Failed to write secret to {}", path))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(secret).context("Failed to write secret to stdout")?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_secret_to_file() {
        let dir = tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("secret")).unwrap();

        write_secret(Some(path.as_path()), b"hunter2\n").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"hunter2\n");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_write_secret_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("secret")).unwrap();
        std::fs::write(&path, b"previous, much longer contents").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_secret(Some(path.as_path()), b"hunter2").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"hunter2");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
