//! Error types for self-update.

use trellis_install::InstallError;

/// Result type for update operations.
pub type UpdateResult<T> = Result<T, UpdateError>;

/// Update error types.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// The release feed could not be queried.
    #[error("failed to query release feed: {reason}")]
    ReleaseFeed { reason: String },

    /// The feed answered but lists no release.
    #[error("no releases found")]
    NoReleases,

    /// The release has no asset for this platform.
    #[error("no binary found for {platform} in release {tag} (download it manually from {notes_url})")]
    NoMatchingAsset {
        platform: String,
        tag: String,
        notes_url: String,
    },

    /// The running executable could not be located.
    #[error("failed to locate the current executable")]
    CurrentExe(#[source] std::io::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// Downloading or installing the new binary failed.
    #[error(transparent)]
    Install(#[from] InstallError),
}
