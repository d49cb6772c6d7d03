//! Configuration schema.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Owner of the built-in default registry.
pub const DEFAULT_REGISTRY_OWNER: &str = "trellis-dev";

/// Repository of the built-in default registry.
pub const DEFAULT_REGISTRY_REPO: &str = "trellis-registry";

/// Branch used when a registry entry does not name one.
pub const DEFAULT_BRANCH: &str = "main";

/// Source type used when a registry entry does not name one.
pub const DEFAULT_SOURCE_TYPE: &str = "github";

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Plugin registries, in the order they were configured.
    #[serde(default)]
    pub registries: Vec<RegistrySourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registries: vec![RegistrySourceConfig::default_registry()],
        }
    }
}

/// One configured plugin catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySourceConfig {
    /// Unique registry name.
    pub name: String,

    /// Backend type. Only `github` is currently implemented.
    #[serde(rename = "type", default = "default_source_type")]
    pub source_type: String,

    /// Repository owner.
    pub owner: String,

    /// Repository name.
    pub repo: String,

    /// Branch holding the catalog.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Lower values are consulted first.
    #[serde(default)]
    pub priority: i32,
}

impl RegistrySourceConfig {
    /// Creates a GitHub registry entry with the default branch.
    #[must_use]
    pub fn github(
        name: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_type: default_source_type(),
            owner: owner.into(),
            repo: repo.into(),
            branch: default_branch(),
            priority: 0,
        }
    }

    /// Sets the branch.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// The registry every fresh installation starts with.
    #[must_use]
    pub fn default_registry() -> Self {
        Self::github("default", DEFAULT_REGISTRY_OWNER, DEFAULT_REGISTRY_REPO)
    }
}

fn default_source_type() -> String {
    DEFAULT_SOURCE_TYPE.to_string()
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

impl Config {
    /// Fills in values that were absent or left blank in the file.
    ///
    /// A file without any registries falls back to the default registry.
    pub(crate) fn normalize(&mut self) {
        if self.registries.is_empty() {
            self.registries.push(RegistrySourceConfig::default_registry());
        }
        for registry in &mut self.registries {
            if registry.branch.trim().is_empty() {
                registry.branch = default_branch();
            }
            if registry.source_type.trim().is_empty() {
                registry.source_type = default_source_type();
            }
        }
    }

    /// Checks structural rules that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error if a registry is missing its name, owner or repo, or
    /// if two registries share a name.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen = std::collections::HashSet::new();
        for (i, registry) in self.registries.iter().enumerate() {
            if registry.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "registries[{i}]: name is required"
                )));
            }
            if registry.owner.trim().is_empty() || registry.repo.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "registry {}: owner and repo are required",
                    registry.name
                )));
            }
            if !seen.insert(registry.name.as_str()) {
                return Err(ConfigError::DuplicateRegistry(registry.name.clone()));
            }
        }
        Ok(())
    }

    /// Returns the registry with the given name.
    #[must_use]
    pub fn registry(&self, name: &str) -> Option<&RegistrySourceConfig> {
        self.registries.iter().find(|r| r.name == name)
    }

    /// Appends a registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a registry with the same name already exists.
    pub fn add_registry(&mut self, registry: RegistrySourceConfig) -> ConfigResult<()> {
        if self.registry(&registry.name).is_some() {
            return Err(ConfigError::DuplicateRegistry(registry.name));
        }
        self.registries.push(registry);
        Ok(())
    }

    /// Removes a registry by name and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if no registry has that name, or if it is the only
    /// registry left. An empty list would load back as the default registry.
    pub fn remove_registry(&mut self, name: &str) -> ConfigResult<RegistrySourceConfig> {
        let index = self
            .registries
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| ConfigError::UnknownRegistry(name.to_string()))?;
        if self.registries.len() == 1 {
            return Err(ConfigError::LastRegistry(name.to_string()));
        }
        Ok(self.registries.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.registries.len(), 1);

        let registry = &config.registries[0];
        assert_eq!(registry.name, "default");
        assert_eq!(registry.source_type, "github");
        assert_eq!(registry.owner, DEFAULT_REGISTRY_OWNER);
        assert_eq!(registry.repo, DEFAULT_REGISTRY_REPO);
        assert_eq!(registry.branch, "main");
        assert_eq!(registry.priority, 0);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [[registries]]
            name = "acme"
            owner = "acme"
            repo = "plugins"
        "#,
        )
        .unwrap();

        let registry = &config.registries[0];
        assert_eq!(registry.source_type, "github");
        assert_eq!(registry.branch, "main");
        assert_eq!(registry.priority, 0);
    }

    #[test]
    fn test_deserialize_explicit_values() {
        let config: Config = toml::from_str(
            r#"
            [[registries]]
            name = "my-org"
            type = "github"
            owner = "my-org"
            repo = "my-plugins"
            branch = "stable"
            priority = 1
        "#,
        )
        .unwrap();

        let registry = &config.registries[0];
        assert_eq!(registry.name, "my-org");
        assert_eq!(registry.branch, "stable");
        assert_eq!(registry.priority, 1);
    }

    #[test]
    fn test_add_registry_rejects_duplicate() {
        let mut config = Config::default();
        let result = config.add_registry(RegistrySourceConfig::github("default", "a", "b"));
        assert!(matches!(result, Err(ConfigError::DuplicateRegistry(name)) if name == "default"));
    }

    #[test]
    fn test_add_and_remove_registry() {
        let mut config = Config::default();
        config
            .add_registry(RegistrySourceConfig::github("acme", "acme", "plugins").with_priority(5))
            .unwrap();
        assert_eq!(config.registries.len(), 2);

        let removed = config.remove_registry("acme").unwrap();
        assert_eq!(removed.priority, 5);
        assert_eq!(config.registries.len(), 1);
    }

    #[test]
    fn test_remove_last_registry_refused() {
        let mut config = Config::default();
        assert!(matches!(
            config.remove_registry("default"),
            Err(ConfigError::LastRegistry(name)) if name == "default"
        ));
        assert_eq!(config.registries.len(), 1);
    }

    #[test]
    fn test_remove_unknown_registry() {
        let mut config = Config::default();
        assert!(matches!(
            config.remove_registry("missing"),
            Err(ConfigError::UnknownRegistry(_))
        ));
    }

    #[test]
    fn test_validate_rejects_blank_owner() {
        let config = Config {
            registries: vec![RegistrySourceConfig::github("x", "", "repo")],
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let config = Config {
            registries: vec![
                RegistrySourceConfig::github("x", "a", "b"),
                RegistrySourceConfig::github("x", "c", "d"),
            ],
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateRegistry(_))
        ));
    }

    #[test]
    fn test_normalize_blank_branch() {
        let mut config = Config {
            registries: vec![RegistrySourceConfig::github("x", "a", "b").with_branch("")],
        };
        config.normalize();
        assert_eq!(config.registries[0].branch, "main");
    }
}
