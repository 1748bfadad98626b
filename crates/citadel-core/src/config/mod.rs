//! Configuration loading

mod loader;

pub use loader::{CitadelConfig, CONFIG_FILE_NAMES};
