//! Configuration loader.
//!
//! Configuration is looked up along a layered search path; the first layer
//! that yields a file wins:
//!
//! 1. an explicit `--config` path
//! 2. the `TRELLIS_CONFIG` environment variable
//! 3. `.trellis.toml` in the working directory or any parent
//! 4. `<user config dir>/trellis/config.toml`
//!
//! When nothing is found the built-in default configuration is used, and
//! writes go to the user config file.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Config, ConfigError, ConfigResult};

/// Project-local configuration file name.
pub const CONFIG_FILE_NAME: &str = ".trellis.toml";

/// Environment variable overriding the configuration path.
pub const CONFIG_ENV_VAR: &str = "TRELLIS_CONFIG";

/// A loaded configuration together with the file it belongs to.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The configuration.
    pub config: Config,
    /// Where the configuration was read from, and where it should be saved.
    pub path: PathBuf,
    /// Whether `path` existed when the configuration was loaded.
    pub from_file: bool,
}

/// Loads configuration from the given path.
///
/// A missing file yields the default configuration.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, parsed or validated.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    debug!(?path, "loading configuration");

    if !path.exists() {
        debug!(?path, "configuration file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;
    let mut config: Config =
        toml::from_str(&content).map_err(|source| ConfigError::InvalidToml {
            path: path.to_path_buf(),
            source,
        })?;
    config.normalize();
    config.validate()?;

    Ok(config)
}

/// Saves configuration to the given path, creating parent directories.
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized or written.
pub fn save_config(path: impl AsRef<Path>, config: &Config) -> ConfigResult<()> {
    let path = path.as_ref();
    config.validate()?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    debug!(?path, "saved configuration");

    Ok(())
}

/// Returns the per-user configuration file path.
///
/// # Errors
///
/// Returns an error if the platform has no user configuration directory.
pub fn user_config_path() -> ConfigResult<PathBuf> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join("trellis").join("config.toml"))
}

/// Walks up from `start_dir` looking for a project configuration file.
#[must_use]
pub fn find_project_config(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut dir = start_dir.as_ref();

    loop {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Some(config_path);
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => return None,
        }
    }
}

/// Resolves and loads configuration along the layered search path.
///
/// # Errors
///
/// Returns an error if the selected file cannot be loaded.
pub fn load_layered(explicit: Option<&Path>) -> ConfigResult<LoadedConfig> {
    let env_override = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
    let cwd = std::env::current_dir()?;

    let path = resolve_config_path(explicit, env_override.as_deref(), &cwd, user_config_path)?;
    let from_file = path.exists();
    let config = load_config(&path)?;

    Ok(LoadedConfig {
        config,
        path,
        from_file,
    })
}

/// Picks the configuration file for the given search inputs.
///
/// `user_path` is only consulted when nothing earlier in the search path
/// matches.
fn resolve_config_path(
    explicit: Option<&Path>,
    env_override: Option<&Path>,
    cwd: &Path,
    user_path: impl FnOnce() -> ConfigResult<PathBuf>,
) -> ConfigResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env_override.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = find_project_config(cwd) {
        return Ok(path);
    }
    user_path()
}
