use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_DIR: &str = "zoom-archive";

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .context("Unable to determine config directory")
}

pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Recordings land in the working directory unless configured otherwise.
pub fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
