//! The download, verify, extract and place pipeline.
//!
//! Both plugin installs and self-update run through [`InstallPipeline`].
//! Nothing is written to a final location before the payload has passed
//! verification and, for archives, extraction.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use trellis_registry::PluginDownload;

use crate::checksum::{ChecksumManifest, verify_sha256};
use crate::download::{Downloader, PAYLOAD_TIMEOUT, SMALL_FILE_TIMEOUT};
use crate::extract::{extract_tar_gz, find_binary, is_gzip};
use crate::replace::{ReplaceOutcome, replace_executable};
use crate::storage::PluginStorage;
use crate::{InstallError, InstallResult};

/// How a payload's integrity is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedDigest<'a> {
    /// Nothing to verify against.
    Unverified,
    /// A known hex SHA-256 digest.
    Sha256(&'a str),
    /// A `checksums.txt` at `url` listing the digest of `asset`.
    ChecksumsFile { url: &'a str, asset: &'a str },
}

impl<'a> ExpectedDigest<'a> {
    /// Uses `digest` when it is non-empty.
    #[must_use]
    pub fn optional(digest: &'a str) -> Self {
        if digest.trim().is_empty() {
            Self::Unverified
        } else {
            Self::Sha256(digest)
        }
    }
}

/// Runs downloads through verification before anything touches disk.
#[derive(Debug, Clone)]
pub struct InstallPipeline {
    payloads: Downloader,
    small_files: Downloader,
}

impl InstallPipeline {
    /// Creates a pipeline with the default timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be built.
    pub fn new() -> InstallResult<Self> {
        Ok(Self {
            payloads: Downloader::new(PAYLOAD_TIMEOUT)?,
            small_files: Downloader::new(SMALL_FILE_TIMEOUT)?,
        })
    }

    /// Downloads `url` and checks it against `expected`.
    ///
    /// # Errors
    ///
    /// Returns a download error, or an integrity error if verification fails.
    pub async fn fetch_verified(&self, url: &str, expected: ExpectedDigest<'_>) -> InstallResult<Bytes> {
        let bytes = self.payloads.fetch(url).await?;

        match expected {
            ExpectedDigest::Unverified => {
                tracing::debug!(%url, "no checksum available, skipping verification");
            }
            ExpectedDigest::Sha256(digest) => verify_sha256(&bytes, digest, url)?,
            ExpectedDigest::ChecksumsFile {
                url: checksums_url,
                asset,
            } => {
                let text = self.small_files.fetch(checksums_url).await?;
                ChecksumManifest::parse(&String::from_utf8_lossy(&text)).verify(asset, &bytes)?;
            }
        }

        Ok(bytes)
    }

    /// Downloads a plugin payload and installs it as `<root>/<name>/`.
    ///
    /// Archives are extracted; any other payload is written as the plugin's
    /// executable.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails. A previous install of the plugin
    /// is left untouched in that case.
    pub async fn install_plugin(
        &self,
        storage: &PluginStorage,
        name: &str,
        download: &PluginDownload,
    ) -> InstallResult<PathBuf> {
        let bytes = self
            .fetch_verified(&download.url, ExpectedDigest::optional(&download.sha256))
            .await?;

        storage.install_dir(name, |dir| {
            if is_gzip(&bytes) {
                extract_tar_gz(&bytes, dir)?;
            } else {
                PluginStorage::write_executable(dir, name, &bytes)?;
            }
            Ok(())
        })
    }

    /// Downloads a new build of an executable and swaps it in for `target`.
    ///
    /// Archive payloads are unpacked into a temporary directory and the file
    /// named `binary_name` (or `binary_name.exe`) is taken from them.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails. `target` is only modified by the
    /// final rename.
    pub async fn install_executable(
        &self,
        url: &str,
        expected: ExpectedDigest<'_>,
        target: &Path,
        binary_name: &str,
    ) -> InstallResult<ReplaceOutcome> {
        let bytes = self.fetch_verified(url, expected).await?;

        let payload = if is_gzip(&bytes) {
            let unpacked = tempfile::tempdir()?;
            extract_tar_gz(&bytes, unpacked.path())?;
            let binary = find_binary(unpacked.path(), binary_name).ok_or_else(|| {
                InstallError::BinaryNotFound {
                    name: binary_name.to_string(),
                }
            })?;
            Bytes::from(std::fs::read(binary)?)
        } else {
            bytes
        };

        replace_executable(target, &payload)
    }
}
