//! In-memory registry source for tests.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{RegistryError, RegistryManifest, RegistryResult, RegistrySource};

/// A source backed by manifests held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    name: String,
    manifests: BTreeMap<String, RegistryManifest>,
}

impl InMemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            manifests: BTreeMap::new(),
        }
    }

    /// Adds a manifest under its own name.
    #[must_use]
    pub fn with_manifest(mut self, manifest: RegistryManifest) -> Self {
        self.insert(manifest);
        self
    }

    /// Adds or replaces a manifest.
    pub fn insert(&mut self, manifest: RegistryManifest) {
        self.manifests.insert(manifest.name.clone(), manifest);
    }
}

#[async_trait]
impl RegistrySource for InMemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_plugins(&self) -> RegistryResult<Vec<String>> {
        Ok(self.manifests.keys().cloned().collect())
    }

    async fn fetch_manifest(&self, name: &str) -> RegistryResult<RegistryManifest> {
        self.manifests
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::PluginNotFound {
                name: name.to_string(),
                registries: vec![self.name.clone()],
            })
    }
}
