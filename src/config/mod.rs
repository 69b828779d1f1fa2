//! Configuration management for kline

mod io;
mod types;

pub use types::*;

use anyhow::Result;
use std::path::{Path, PathBuf};

impl Config {
    /// Get the config file path (~/.config/kline/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        io::config_path()
    }

    /// Get the config directory path (~/.config/kline)
    pub fn config_dir() -> Result<PathBuf> {
        io::config_dir()
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> Result<Self> {
        io::load()
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        io::load_from(path)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        io::save(self)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        io::save_to(self, path)
    }
}
