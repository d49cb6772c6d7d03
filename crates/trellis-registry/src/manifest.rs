//! Registry manifest data model.
//!
//! A manifest is the JSON document a catalog publishes for each plugin at
//! `plugins/<name>/manifest.json`. Unknown fields are ignored.

use serde::{Deserialize, Serialize};

use crate::{RegistryError, RegistryResult};

/// Describes one installable plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    /// `builtin` or `external`.
    #[serde(rename = "type", default)]
    pub plugin_type: String,
    /// `core` or `community`.
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub license: String,
    /// Oldest host engine version the plugin runs on.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub min_engine_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub downloads: Vec<PluginDownload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<PluginAssets>,
}

/// One platform binary of a plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDownload {
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub arch: String,
    #[serde(default)]
    pub url: String,
    /// Hex SHA-256 of the payload. Optional.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sha256: String,
}

/// Optional bundled assets a plugin ships besides its binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginAssets {
    /// Ships a UI bundle.
    #[serde(default)]
    pub ui: bool,
    /// Ships a configuration schema.
    #[serde(default)]
    pub config_schema: bool,
}

impl RegistryManifest {
    /// Parses a manifest from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Returns `true` for plugins shipped as separate binaries.
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.plugin_type == "external"
    }

    /// Returns the first download for the given platform.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoDownload`] if no entry matches.
    pub fn find_download(&self, os: &str, arch: &str) -> RegistryResult<&PluginDownload> {
        self.downloads
            .iter()
            .find(|d| d.os == os && d.arch == arch)
            .ok_or_else(|| RegistryError::NoDownload {
                name: self.name.clone(),
                os: os.to_string(),
                arch: arch.to_string(),
            })
    }

    /// Returns `true` if the manifest matches a search query.
    ///
    /// An empty query matches everything; otherwise the query is matched
    /// case-insensitively as a substring of the name, description or any keyword.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }

        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self
                .keywords
                .iter()
                .any(|k| k.to_lowercase().contains(&query))
    }

    /// Condenses the manifest into a search listing entry.
    #[must_use]
    pub fn summary(&self) -> PluginSummary {
        PluginSummary {
            name: self.name.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            tier: self.tier.clone(),
        }
    }
}

/// The part of a manifest shown in search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSummary {
    pub name: String,
    pub version: String,
    pub description: String,
    pub tier: String,
}

/// A search hit together with the registry it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSearchResult {
    pub summary: PluginSummary,
    /// Name of the registry that supplied `summary`.
    pub source: String,
}

impl PluginSearchResult {
    /// Returns the plugin name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.summary.name
    }
}

/// Returns `true` if `name` can be used as a single path segment in a
/// catalog URL and on disk.
///
/// Accepts ASCII letters, digits, `-`, `_` and `.`, but not a leading `.`.
#[must_use]
pub fn is_valid_plugin_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
