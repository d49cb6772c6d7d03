//! Plugin registry resolution for Trellis.
//!
//! This crate handles:
//! - The plugin manifest data model and its validation
//! - Version comparison for manifests and release tags
//! - Registry sources, including GitHub-hosted catalogs
//! - Priority-ordered resolution across several registries

pub mod error;
pub mod github;
pub mod manifest;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod multi;
pub mod platform;
pub mod source;
pub mod validate;
pub mod version;

pub use error::{RegistryError, RegistryResult, validation_report};
pub use github::{GithubRegistrySource, source_from_config};
pub use manifest::{
    PluginAssets, PluginDownload, PluginSearchResult, PluginSummary, RegistryManifest,
    is_valid_plugin_name,
};
pub use multi::MultiRegistry;
pub use platform::Platform;
#[cfg(any(test, feature = "test-util"))]
pub use memory::InMemorySource;
pub use source::RegistrySource;
pub use validate::{ManifestVocabulary, ValidationError, ValidationOptions, validate_manifest};
pub use version::{compare_versions, is_newer, strip_tag_prefix};
