//! Priority-ordered resolution across several catalogs.

use std::collections::{BTreeMap, BTreeSet};

use futures::future::join_all;
use trellis_config::RegistrySourceConfig;

use crate::github::source_from_config;
use crate::manifest::is_valid_plugin_name;
use crate::{PluginSearchResult, RegistryError, RegistryManifest, RegistryResult, RegistrySource};

/// An ordered set of registry sources.
///
/// Sources are sorted by ascending priority once, at construction. Sources
/// sharing a priority keep the order they were given in.
pub struct MultiRegistry {
    sources: Vec<Box<dyn RegistrySource>>,
}

impl MultiRegistry {
    /// Builds the resolver from configured registries.
    ///
    /// # Errors
    ///
    /// Returns an error if any registry has an unsupported type or its client
    /// cannot be built.
    pub fn new(configs: &[RegistrySourceConfig]) -> RegistryResult<Self> {
        let sources = configs
            .iter()
            .map(|config| Ok((config.priority, source_from_config(config)?)))
            .collect::<RegistryResult<Vec<_>>>()?;
        Ok(Self::from_sources(sources))
    }

    /// Builds the resolver from ready-made sources and their priorities.
    #[must_use]
    pub fn from_sources(mut sources: Vec<(i32, Box<dyn RegistrySource>)>) -> Self {
        sources.sort_by_key(|(priority, _)| *priority);
        Self {
            sources: sources.into_iter().map(|(_, source)| source).collect(),
        }
    }

    /// Returns the sources in resolution order.
    pub fn sources(&self) -> impl Iterator<Item = &dyn RegistrySource> {
        self.sources.iter().map(AsRef::as_ref)
    }

    /// Returns the source names in resolution order.
    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }

    /// Fetches a manifest from the first source that has it.
    ///
    /// Returns the manifest together with the name of the source that
    /// supplied it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidPluginName`] if `name` is not a plain
    /// path segment, or [`RegistryError::PluginNotFound`] naming every
    /// consulted source if none of them produced the manifest.
    pub async fn fetch_manifest(&self, name: &str) -> RegistryResult<(RegistryManifest, String)> {
        if !is_valid_plugin_name(name) {
            return Err(RegistryError::InvalidPluginName {
                name: name.to_string(),
            });
        }

        for source in &self.sources {
            match source.fetch_manifest(name).await {
                Ok(manifest) => return Ok((manifest, source.name().to_string())),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(registry = source.name(), plugin = name, "plugin not in registry");
                }
                Err(e) => {
                    tracing::warn!(registry = source.name(), plugin = name, error = %e, "registry lookup failed");
                }
            }
        }

        Err(RegistryError::PluginNotFound {
            name: name.to_string(),
            registries: self.source_names(),
        })
    }

    /// Lists every plugin name known to any reachable source, each once and
    /// sorted by name.
    ///
    /// Sources that fail are skipped.
    pub async fn list_plugins(&self) -> Vec<String> {
        let listings = join_all(self.sources.iter().map(|s| s.list_plugins())).await;

        let mut names = BTreeSet::new();
        for (source, listing) in self.sources.iter().zip(listings) {
            match listing {
                Ok(listing) => names.extend(listing),
                Err(e) => {
                    tracing::warn!(registry = source.name(), error = %e, "skipping registry");
                }
            }
        }
        names.into_iter().collect()
    }

    /// Searches every reachable source, sorted by plugin name.
    ///
    /// A plugin published by several sources is reported once, with the data
    /// of the highest-priority source.
    pub async fn search_plugins(&self, query: &str) -> Vec<PluginSearchResult> {
        let searches = join_all(self.sources.iter().map(|s| s.search_plugins(query))).await;

        let mut merged = BTreeMap::new();
        for (source, results) in self.sources.iter().zip(searches) {
            match results {
                Ok(results) => {
                    for result in results {
                        merged.entry(result.name().to_string()).or_insert(result);
                    }
                }
                Err(e) => {
                    tracing::warn!(registry = source.name(), error = %e, "skipping registry");
                }
            }
        }
        merged.into_values().collect()
    }
}

impl std::fmt::Debug for MultiRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiRegistry")
            .field("sources", &self.source_names())
            .finish()
    }
}
