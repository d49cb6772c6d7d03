//! The registry source abstraction.

use async_trait::async_trait;

use crate::{PluginSearchResult, RegistryManifest, RegistryResult};

/// A named catalog of plugin manifests.
#[async_trait]
pub trait RegistrySource: Send + Sync {
    /// Returns the configured name of this source.
    fn name(&self) -> &str;

    /// Lists the names of every plugin in the catalog.
    async fn list_plugins(&self) -> RegistryResult<Vec<String>>;

    /// Fetches and parses one plugin's manifest.
    ///
    /// Returns [`PluginNotFound`](crate::RegistryError::PluginNotFound) if the catalog has no such
    /// plugin.
    async fn fetch_manifest(&self, name: &str) -> RegistryResult<RegistryManifest>;

    /// Returns summaries of the plugins matching `query`, sorted by name.
    ///
    /// Plugins whose manifest cannot be fetched are skipped.
    async fn search_plugins(&self, query: &str) -> RegistryResult<Vec<PluginSearchResult>> {
        let names = self.list_plugins().await?;
        let mut results = Vec::new();

        for name in names {
            let manifest = match self.fetch_manifest(&name).await {
                Ok(manifest) => manifest,
                Err(e) => {
                    tracing::debug!(registry = self.name(), plugin = %name, error = %e, "skipping plugin");
                    continue;
                }
            };
            if manifest.matches_query(query) {
                results.push(PluginSearchResult {
                    summary: manifest.summary(),
                    source: self.name().to_string(),
                });
            }
        }

        results.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySource;

    fn manifest(name: &str, description: &str) -> RegistryManifest {
        RegistryManifest {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            description: description.to_string(),
            tier: "community".to_string(),
            ..RegistryManifest::default()
        }
    }

    #[tokio::test]
    async fn test_in_memory_fetch() {
        let source = InMemorySource::new("local").with_manifest(manifest("auth", "JWT auth"));

        let found = source.fetch_manifest("auth").await.unwrap();
        assert_eq!(found.description, "JWT auth");

        let err = source.fetch_manifest("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_default_search_filters_and_sorts() {
        let source = InMemorySource::new("local")
            .with_manifest(manifest("zeta-cache", "Cache layer"))
            .with_manifest(manifest("auth", "JWT auth"))
            .with_manifest(manifest("alpha-cache", "Another cache"));

        let results = source.search_plugins("cache").await.unwrap();
        let names: Vec<_> = results.iter().map(PluginSearchResult::name).collect();
        assert_eq!(names, ["alpha-cache", "zeta-cache"]);
        assert!(results.iter().all(|r| r.source == "local"));

        let all = source.search_plugins("").await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
