//! Configuration for the firegate proxy.
//!
//! Layers, later overriding earlier:
//! 1. `~/.config/firegate/config.toml` (user config)
//! 2. `./firegate.toml` (project-local)
//! 3. an explicit `--config` / `FIREGATE_CONFIG` file
//! 4. environment variables (`FIREFLY_III_*`, `SESSION_SECRET`, `FIREGATE_*`)
//!
//! The merged layers are then resolved into a [`ResolvedConfig`], which is
//! the only form the server accepts. Missing required values fail here, at
//! startup, never per request.

pub mod discovery;
pub mod env;
pub mod error;
pub mod resolver;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_from, xdg_config_dir,
    xdg_config_path,
};
pub use env::{from_env, from_env_with};
pub use error::{ConfigError, Result};
pub use resolver::ResolvedConfig;
pub use types::*;
