//! CLI command handlers.

pub mod config;
pub mod start;

use std::path::PathBuf;

use anyhow::Result;
use firegate_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit config file from `--config` / `FIREGATE_CONFIG`.
    pub config_path: Option<PathBuf>,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Discover and merge every config layer, reporting load warnings.
    pub fn load_config(&self) -> Result<LoadedConfig> {
        let loaded = firegate_config::load_config(self.config_path.as_deref())?;
        for warning in &loaded.warnings {
            eprintln!("warning: {}", warning);
        }
        Ok(loaded)
    }
}
