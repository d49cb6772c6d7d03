//! Secure plugin and executable installation for Trellis.
//!
//! This crate handles:
//! - Downloading payloads and verifying their SHA-256 digests
//! - Extracting `.tar.gz` archives without escaping the destination
//! - Atomically replacing an executable on disk
//! - Local plugin storage and the installed-plugin index

pub mod checksum;
pub mod download;
pub mod error;
pub mod extract;
pub mod index;
pub mod installer;
pub mod pipeline;
pub mod replace;
pub mod storage;
pub mod verify;

pub use checksum::{CHECKSUMS_FILE, ChecksumManifest, sha256_hex, verify_sha256};
pub use download::Downloader;
pub use error::{InstallError, InstallResult};
pub use extract::{extract_tar_gz, find_binary, is_gzip};
pub use index::{InstalledIndex, InstalledPlugin};
pub use installer::{PluginInstaller, UpdateOutcome};
pub use pipeline::{ExpectedDigest, InstallPipeline};
pub use replace::{ReplaceOutcome, replace_executable};
pub use storage::{DATA_DIR_ENV_VAR, PluginStorage};
pub use verify::verify_download_urls;
