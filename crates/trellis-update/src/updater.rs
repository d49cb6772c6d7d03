//! The self-update workflow.

use std::path::{Path, PathBuf};

use trellis_install::{ExpectedDigest, InstallPipeline, ReplaceOutcome};
use trellis_registry::{Platform, is_newer, strip_tag_prefix};

use crate::asset::{find_checksum_asset, find_release_asset};
use crate::release::{Release, ReleaseFeed};
use crate::{UpdateError, UpdateResult};

/// Version reported by builds without `TRELLIS_BUILD_VERSION`.
pub const DEV_VERSION: &str = "dev";

/// Version baked in at compile time.
pub const BUILD_VERSION: &str = match option_env!("TRELLIS_BUILD_VERSION") {
    Some(version) => version,
    None => DEV_VERSION,
};

/// Returns `true` for development builds.
#[must_use]
pub fn is_dev_build(version: &str) -> bool {
    strip_tag_prefix(version) == DEV_VERSION
}

/// Result of an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate {
        current: String,
    },
    Available {
        current: String,
        latest: String,
        notes_url: String,
    },
}

/// Result of an update run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateReport {
    /// The running version is already the latest.
    AlreadyLatest { version: String },
    /// The new binary is in place, or staged next to the old one.
    Installed {
        tag: String,
        outcome: ReplaceOutcome,
    },
}

/// Checks for and installs new releases of a binary.
#[derive(Debug, Clone)]
pub struct SelfUpdater {
    feed: ReleaseFeed,
    current_version: String,
    binary_name: String,
    platform: Platform,
}

impl SelfUpdater {
    /// Creates an updater for `binary_name` running at `current_version`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(binary_name: &str, current_version: &str) -> UpdateResult<Self> {
        let feed = ReleaseFeed::new(&format!("{binary_name}/{current_version}"))?;
        Ok(Self {
            feed,
            current_version: current_version.to_string(),
            binary_name: binary_name.to_string(),
            platform: Platform::current(),
        })
    }

    /// Uses a different release feed.
    #[must_use]
    pub fn with_feed(mut self, feed: ReleaseFeed) -> Self {
        self.feed = feed;
        self
    }

    /// Selects assets for `platform` instead of the host.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Returns the running version.
    #[must_use]
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Compares the running version with the latest release.
    ///
    /// Development builds always report up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the release feed cannot be queried.
    pub async fn check(&self) -> UpdateResult<UpdateStatus> {
        let release = self.feed.latest().await?;
        Ok(self.status_for(&release))
    }

    /// Installs the latest release over `target` if it is newer.
    ///
    /// Development builds always install the latest release.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed cannot be queried, no asset fits this
    /// platform, or the download fails verification. `target` is left
    /// untouched in every error case.
    pub async fn update(&self, target: &Path) -> UpdateResult<UpdateReport> {
        let dev = is_dev_build(&self.current_version);
        if dev {
            tracing::warn!("running a development build; installing the latest release");
        }

        let release = self.feed.latest().await?;
        if !dev && !is_newer(release.version(), strip_tag_prefix(&self.current_version)) {
            return Ok(UpdateReport::AlreadyLatest {
                version: self.current_version.clone(),
            });
        }

        let asset = find_release_asset(&release.assets, &self.binary_name, &self.platform)
            .ok_or_else(|| UpdateError::NoMatchingAsset {
                platform: self.platform.to_string(),
                tag: release.tag_name.clone(),
                notes_url: release.html_url.clone(),
            })?;

        let expected = match find_checksum_asset(&release.assets) {
            Some(checksums) => ExpectedDigest::ChecksumsFile {
                url: &checksums.browser_download_url,
                asset: &asset.name,
            },
            None => ExpectedDigest::Unverified,
        };

        tracing::info!("Downloading {}", asset.name);
        let outcome = InstallPipeline::new()?
            .install_executable(&asset.browser_download_url, expected, target, &self.binary_name)
            .await?;

        Ok(UpdateReport::Installed {
            tag: release.tag_name,
            outcome,
        })
    }

    fn status_for(&self, release: &Release) -> UpdateStatus {
        let current = self.current_version.clone();
        if is_dev_build(&current) || !is_newer(release.version(), strip_tag_prefix(&current)) {
            return UpdateStatus::UpToDate { current };
        }

        UpdateStatus::Available {
            current,
            latest: release.tag_name.clone(),
            notes_url: release.html_url.clone(),
        }
    }
}

/// Returns the path of the running executable with symlinks resolved.
///
/// # Errors
///
/// Returns [`UpdateError::CurrentExe`] if the path cannot be determined.
pub fn current_executable() -> UpdateResult<PathBuf> {
    std::env::current_exe()
        .and_then(std::fs::canonicalize)
        .map_err(UpdateError::CurrentExe)
}
