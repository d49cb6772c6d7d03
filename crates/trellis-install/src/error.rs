//! Error types for the install pipeline.

use std::path::PathBuf;

use trellis_registry::RegistryError;

/// Result type for install operations.
pub type InstallResult<T> = Result<T, InstallError>;

/// Install error types.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// Transport failure or non-success HTTP status.
    #[error("failed to download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Downloaded bytes do not match the expected digest.
    #[error("checksum mismatch for {subject}: expected {expected}, got {actual}")]
    IntegrityCheckFailed {
        subject: String,
        expected: String,
        actual: String,
    },

    /// The checksums file has no line for the verified asset.
    #[error("checksums file has no entry for {asset}")]
    ChecksumNotListed { asset: String },

    /// An archive entry would land outside the destination directory.
    #[error("archive entry {entry:?} escapes the destination directory")]
    PathTraversal { entry: String },

    /// The archive could not be read.
    #[error("invalid archive: {reason}")]
    InvalidArchive { reason: String },

    /// The archive does not contain the expected executable.
    #[error("archive does not contain an executable named {name}")]
    BinaryNotFound { name: String },

    /// The requested version is not the one the registry offers.
    #[error("{name}@{requested} is not available (registry has {available})")]
    VersionUnavailable {
        name: String,
        requested: String,
        available: String,
    },

    /// Builtin plugins ship with the engine.
    #[error("plugin {name} is built into the engine and cannot be installed separately")]
    Builtin { name: String },

    /// The plugin is not installed.
    #[error("plugin not installed: {name}")]
    NotInstalled { name: String },

    /// No install root could be determined.
    #[error("could not determine a data directory for installed plugins")]
    NoDataDir,

    /// Failed to read the installed-plugin index.
    #[error("failed to parse installed plugin index {path}")]
    IndexParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Failed to serialize the installed-plugin index.
    #[error("failed to serialize installed plugin index")]
    IndexSerialize(#[source] toml::ser::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// Registry lookup failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InstallError {
    /// Returns `true` for checksum and path-traversal violations.
    #[must_use]
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            Self::IntegrityCheckFailed { .. } | Self::ChecksumNotListed { .. } | Self::PathTraversal { .. }
        )
    }
}
