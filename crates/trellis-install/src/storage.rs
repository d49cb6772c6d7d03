//! Local plugin storage management.
//!
//! Plugins are stored under the install root with the following structure:
//! ```text
//! <root>/
//! ├── auth/
//! │   └── auth
//! ├── cache/
//! │   ├── cache
//! │   └── share/...
//! └── installed.toml
//! ```

use std::path::{Component, Path, PathBuf};

use crate::extract::set_mode;
use crate::{InstallError, InstallResult};

/// Environment variable overriding the install root.
pub const DATA_DIR_ENV_VAR: &str = "TRELLIS_DATA_DIR";

/// File name of the installed-plugin index.
pub const INDEX_FILE_NAME: &str = "installed.toml";

/// Manages the plugin install root.
#[derive(Debug, Clone)]
pub struct PluginStorage {
    root: PathBuf,
}

impl PluginStorage {
    /// Opens the install root, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> InstallResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the default install root: `$TRELLIS_DATA_DIR`, or
    /// `<user data dir>/trellis/plugins`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::NoDataDir`] if neither is available.
    pub fn default_root() -> InstallResult<PathBuf> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        dirs::data_dir()
            .map(|dir| dir.join("trellis").join("plugins"))
            .ok_or(InstallError::NoDataDir)
    }

    /// Returns the install root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the index file path.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE_NAME)
    }

    /// Returns the directory of one plugin.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::PathTraversal`] if `name` is not a plain file
    /// name.
    pub fn plugin_dir(&self, name: &str) -> InstallResult<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if name != INDEX_FILE_NAME && !name.starts_with('.') => {
                Ok(self.root.join(name))
            }
            _ => Err(InstallError::PathTraversal {
                entry: name.to_string(),
            }),
        }
    }

    /// Installs a plugin directory.
    ///
    /// `populate` fills a staging directory inside the root. Only if it
    /// succeeds is any previous install removed and the staging directory
    /// renamed into place. On failure the staging directory is deleted and
    /// the previous install, if any, is left as it was.
    ///
    /// # Errors
    ///
    /// Returns the error of `populate`, or an IO error from the final move.
    pub fn install_dir<F>(&self, name: &str, populate: F) -> InstallResult<PathBuf>
    where
        F: FnOnce(&Path) -> InstallResult<()>,
    {
        let final_dir = self.plugin_dir(name)?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.root)?;

        populate(staging.path())?;

        if final_dir.exists() {
            std::fs::remove_dir_all(&final_dir)?;
        }
        std::fs::rename(staging.path(), &final_dir)?;

        tracing::info!("Installed {name} to {}", final_dir.display());
        Ok(final_dir)
    }

    /// Writes a bare executable payload as `<dir>/<name>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_executable(dir: &Path, name: &str, bytes: &[u8]) -> InstallResult<PathBuf> {
        let file_name = if cfg!(windows) {
            format!("{name}.exe")
        } else {
            name.to_string()
        };
        let path = dir.join(file_name);
        std::fs::write(&path, bytes)?;
        set_mode(&path, 0o755)?;
        Ok(path)
    }

    /// Deletes a plugin directory if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    pub fn remove_dir(&self, name: &str) -> InstallResult<()> {
        let dir = self.plugin_dir(name)?;
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
            tracing::info!("Removed plugin from {}", dir.display());
        }
        Ok(())
    }
}
