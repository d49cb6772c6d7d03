//! Error types for registry resolution.

use crate::validate::ValidationError;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry error types.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The catalog could not be reached or answered with a non-success status.
    #[error("registry {registry} is unavailable: {reason}")]
    Unavailable { registry: String, reason: String },

    /// The plugin is absent from every registry that was consulted.
    #[error("plugin {name} not found in {}", registry_list(.registries))]
    PluginNotFound {
        name: String,
        registries: Vec<String>,
    },

    /// The plugin name is not a plain path segment.
    #[error("invalid plugin name {name:?}")]
    InvalidPluginName { name: String },

    /// A manifest document could not be parsed.
    #[error("malformed manifest for {name} in registry {registry}")]
    MalformedManifest {
        name: String,
        registry: String,
        #[source]
        source: serde_json::Error,
    },

    /// A manifest failed validation.
    #[error("manifest failed validation with {} error(s):\n{}", .0.len(), validation_report(.0))]
    ValidationFailed(Vec<ValidationError>),

    /// The manifest has no download for the requested platform.
    #[error("plugin {name} has no download for {os}/{arch}")]
    NoDownload {
        name: String,
        os: String,
        arch: String,
    },

    /// A configured registry names a backend that is not implemented.
    #[error("registry {registry} has unsupported type {source_type:?}")]
    UnsupportedSourceType {
        registry: String,
        source_type: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}

impl RegistryError {
    /// Returns `true` for errors meaning the plugin simply is not there.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PluginNotFound { .. })
    }
}

fn registry_list(registries: &[String]) -> String {
    match registries {
        [] => "any registry (none configured)".to_string(),
        [one] => format!("registry {one}"),
        many => format!("any registry ({})", many.join(", ")),
    }
}

/// Renders validation errors one per line.
#[must_use]
pub fn validation_report(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
