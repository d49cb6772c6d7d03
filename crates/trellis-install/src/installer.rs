//! Install, update and removal of plugins resolved from the registries.

use trellis_registry::{
    MultiRegistry, Platform, RegistryError, RegistryManifest, ValidationOptions, compare_versions,
    is_newer, validate_manifest,
};

use crate::index::{InstalledIndex, InstalledPlugin};
use crate::pipeline::InstallPipeline;
use crate::storage::PluginStorage;
use crate::{InstallError, InstallResult};

/// Result of [`PluginInstaller::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A newer version was installed.
    Updated { from: String, plugin: InstalledPlugin },
    /// The installed version is current.
    UpToDate { version: String },
}

/// Plugin install workflow over a set of registries.
pub struct PluginInstaller<'a> {
    registry: &'a MultiRegistry,
    storage: PluginStorage,
    index: InstalledIndex,
    pipeline: InstallPipeline,
    platform: Platform,
}

impl<'a> PluginInstaller<'a> {
    /// Creates an installer for the host platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be loaded or the HTTP clients
    /// cannot be built.
    pub fn new(registry: &'a MultiRegistry, storage: PluginStorage) -> InstallResult<Self> {
        let index = InstalledIndex::load(storage.index_path())?;
        Ok(Self {
            registry,
            storage,
            index,
            pipeline: InstallPipeline::new()?,
            platform: Platform::current(),
        })
    }

    /// Installs downloads for `platform` instead of the host.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Returns the storage.
    #[must_use]
    pub fn storage(&self) -> &PluginStorage {
        &self.storage
    }

    /// Lists installed plugins sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<&InstalledPlugin> {
        self.index.list()
    }

    /// Installs a plugin, optionally pinned to a version.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No registry has the plugin
    /// - The pinned version is not the one the registry offers
    /// - The manifest fails validation or has no download for this platform
    /// - Downloading, verifying or extracting the payload fails
    pub async fn install(&mut self, name: &str, pin: Option<&str>) -> InstallResult<InstalledPlugin> {
        let (manifest, source) = self.registry.fetch_manifest(name).await?;

        if let Some(requested) = pin
            && compare_versions(requested, &manifest.version).is_ne()
        {
            return Err(InstallError::VersionUnavailable {
                name: name.to_string(),
                requested: requested.to_string(),
                available: manifest.version,
            });
        }

        self.install_manifest(name, &manifest, &source).await
    }

    /// Reinstalls a plugin if the registry has a newer version.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::NotInstalled`] if the plugin is not installed,
    /// or any error [`install`](Self::install) can return.
    pub async fn update(&mut self, name: &str) -> InstallResult<UpdateOutcome> {
        let current = self
            .index
            .get(name)
            .map(|p| p.version.clone())
            .ok_or_else(|| InstallError::NotInstalled {
                name: name.to_string(),
            })?;

        let (manifest, source) = self.registry.fetch_manifest(name).await?;
        if !is_newer(&manifest.version, &current) {
            return Ok(UpdateOutcome::UpToDate { version: current });
        }

        let plugin = self.install_manifest(name, &manifest, &source).await?;
        Ok(UpdateOutcome::Updated {
            from: current,
            plugin,
        })
    }

    /// Uninstalls a plugin.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin is not installed or cannot be removed.
    pub fn remove(&mut self, name: &str) -> InstallResult<InstalledPlugin> {
        let plugin = self.index.forget(name)?;
        self.storage.remove_dir(name)?;

        tracing::info!("Uninstalled {} v{}", plugin.name, plugin.version);

        Ok(plugin)
    }

    async fn install_manifest(
        &mut self,
        name: &str,
        manifest: &RegistryManifest,
        source: &str,
    ) -> InstallResult<InstalledPlugin> {
        let errors = validate_manifest(manifest, &ValidationOptions::default());
        if !errors.is_empty() {
            return Err(RegistryError::ValidationFailed(errors).into());
        }
        if !manifest.is_external() {
            return Err(InstallError::Builtin {
                name: name.to_string(),
            });
        }

        let download = manifest.find_download(&self.platform.os, &self.platform.arch)?;

        tracing::info!("Downloading {name} v{} from {source}", manifest.version);
        self.pipeline
            .install_plugin(&self.storage, name, download)
            .await?;

        let plugin = InstalledPlugin {
            name: name.to_string(),
            version: manifest.version.clone(),
            source: source.to_string(),
            tier: manifest.tier.clone(),
            installed_at: chrono::Utc::now(),
        };
        self.index.record(plugin.clone())?;

        tracing::info!("Installed {} v{}", plugin.name, plugin.version);

        Ok(plugin)
    }
}
