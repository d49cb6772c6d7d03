//! Command implementations.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use trellis_config::{LoadedConfig, load_layered};
use trellis_install::PluginStorage;
use trellis_registry::MultiRegistry;

pub mod plugin;
pub mod registry;
pub mod update;

/// Global options shared by every command.
#[derive(Debug)]
pub struct Context {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl Context {
    /// Loads configuration along the search path.
    pub fn load_config(&self) -> Result<LoadedConfig> {
        load_layered(self.config.as_deref()).context("failed to load configuration")
    }

    /// Builds the resolver over the configured registries.
    pub fn registries(&self) -> Result<MultiRegistry> {
        let loaded = self.load_config()?;
        MultiRegistry::new(&loaded.config.registries).context("failed to set up registries")
    }

    /// Opens the plugin install root.
    pub fn storage(&self) -> Result<PluginStorage> {
        let root = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => PluginStorage::default_root()?,
        };
        PluginStorage::new(&root)
            .with_context(|| format!("failed to initialize plugin storage at {}", root.display()))
    }
}
