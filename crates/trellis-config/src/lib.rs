//! Configuration management for Trellis.
//!
//! This crate handles loading, validating and saving the list of plugin
//! registries the CLI resolves plugins from.

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    CONFIG_ENV_VAR, CONFIG_FILE_NAME, LoadedConfig, find_project_config, load_config,
    load_layered, save_config, user_config_path,
};
pub use schema::{
    Config, DEFAULT_BRANCH, DEFAULT_REGISTRY_OWNER, DEFAULT_REGISTRY_REPO, DEFAULT_SOURCE_TYPE,
    RegistrySourceConfig,
};
