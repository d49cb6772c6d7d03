//! Index of installed plugins.
//!
//! The index is stored as a TOML file at `<root>/installed.toml`.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{InstallError, InstallResult};

/// Information about an installed plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPlugin {
    pub name: String,
    /// Installed version.
    pub version: String,
    /// Registry the plugin was installed from.
    pub source: String,
    pub tier: String,
    /// Installation timestamp.
    pub installed_at: chrono::DateTime<chrono::Utc>,
}

/// The index file format.
#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    #[serde(default)]
    plugins: BTreeMap<String, InstalledPlugin>,
}

/// Tracks installed plugins.
#[derive(Debug)]
pub struct InstalledIndex {
    path: PathBuf,
    data: IndexFile,
}

impl InstalledIndex {
    /// Loads the index, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> InstallResult<Self> {
        let path = path.into();

        if !path.exists() {
            return Ok(Self {
                path,
                data: IndexFile::default(),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let data = toml::from_str(&content).map_err(|source| InstallError::IndexParse {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, data })
    }

    /// Saves the index to disk.
    ///
    /// The file is written next to the index and renamed over it, so readers
    /// see either the old or the new index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be serialized or written.
    pub fn save(&self) -> InstallResult<()> {
        let content = toml::to_string_pretty(&self.data).map_err(InstallError::IndexSerialize)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".installed-")
            .tempfile_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }

    /// Returns the index file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lists installed plugins sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<&InstalledPlugin> {
        self.data.plugins.values().collect()
    }

    /// Gets an installed plugin by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&InstalledPlugin> {
        self.data.plugins.get(name)
    }

    /// Checks if a plugin is installed.
    #[must_use]
    pub fn is_installed(&self, name: &str) -> bool {
        self.data.plugins.contains_key(name)
    }

    /// Records an install, replacing any previous entry, and saves.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be saved.
    pub fn record(&mut self, plugin: InstalledPlugin) -> InstallResult<()> {
        self.data.plugins.insert(plugin.name.clone(), plugin);
        self.save()
    }

    /// Removes a plugin entry and saves.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::NotInstalled`] if the plugin is unknown.
    pub fn forget(&mut self, name: &str) -> InstallResult<InstalledPlugin> {
        let plugin = self
            .data
            .plugins
            .remove(name)
            .ok_or_else(|| InstallError::NotInstalled {
                name: name.to_string(),
            })?;

        self.save()?;

        Ok(plugin)
    }
}
