//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/firegate/config.toml` (XDG user config)
//! 2. `./firegate.toml` (project-local)
//! 3. explicit file passed on the command line
//! 4. environment variables

use std::path::{Path, PathBuf};

use crate::{ConfigError, FiregateConfig, Result, env};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "firegate.toml";

/// Default config filename within XDG config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for XDG directory resolution.
const APP_NAME: &str = "firegate";

/// Environment variable to override the user config directory.
const CONFIG_DIR_ENV: &str = "FIREGATE_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration, environment included.
    pub config: FiregateConfig,
    /// Files that were checked, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Discovered files that could not be loaded.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Discover and merge all config layers from the process environment.
///
/// A missing or malformed `explicit` file is an error; discovered files
/// that fail to load only produce a warning.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    load_config_from(
        xdg_config_dir().as_deref(),
        Path::new("."),
        explicit,
        |key| std::env::var(key).ok(),
    )
}

/// Layered load with every input supplied by the caller.
pub fn load_config_from(
    user_dir: Option<&Path>,
    project_dir: &Path,
    explicit: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<LoadedConfig> {
    let mut config = FiregateConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    if let Some(dir) = user_dir {
        sources.push(load_layer(
            &mut config,
            &dir.join(USER_CONFIG_FILE),
            &mut warnings,
        ));
    }

    sources.push(load_layer(
        &mut config,
        &project_dir.join(PROJECT_CONFIG_FILE),
        &mut warnings,
    ));

    if let Some(path) = explicit {
        config.merge(load_config_file(path)?);
        sources.push(ConfigSource {
            path: path.to_path_buf(),
            loaded: true,
        });
    }

    config.merge(env::from_env_with(lookup)?);

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<FiregateConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    FiregateConfig::from_toml(&contents)
}

/// Path of the user config file.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// User config directory.
///
/// Checks `FIREGATE_CONFIG_DIR` first, then falls back to the platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

fn load_layer(config: &mut FiregateConfig, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    let loaded = path.is_file()
        && match load_config_file(path) {
            Ok(layer) => {
                config.merge(layer);
                true
            }
            Err(e) => {
                warnings.push(format!("Failed to load {}: {}", path.display(), e));
                false
            }
        };

    ConfigSource {
        path: path.to_path_buf(),
        loaded,
    }
}
