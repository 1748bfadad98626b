//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

pub use crate::commands::encrypt::EncryptArgs;
pub use crate::commands::get::GetArgs;

/// Citadel - secrets from S3, decrypted on the way out
#[derive(Parser, Debug)]
#[command(name = "citadel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to citadel.yaml (default: search current and parent directories)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a secret, decrypting it if an encryption key is configured
    Get(GetArgs),

    /// Encrypt a value into the stored format
    Encrypt(EncryptArgs),

    /// Show the MD5 fingerprint of the configured encryption key
    Fingerprint,
}
