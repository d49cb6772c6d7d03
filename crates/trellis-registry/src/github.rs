//! GitHub-hosted plugin catalogs.
//!
//! A catalog is a repository holding one `plugins/<name>/manifest.json` per
//! plugin. Plugin names come from the contents API; manifests are read from
//! the raw file host.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use trellis_config::RegistrySourceConfig;

use crate::manifest::is_valid_plugin_name;
use crate::{RegistryError, RegistryManifest, RegistryResult, RegistrySource};

/// Default GitHub REST API endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Default raw file endpoint.
pub const GITHUB_RAW_URL: &str = "https://raw.githubusercontent.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Entry of a contents API directory listing.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(rename = "type")]
    entry_type: String,
}

/// A catalog stored in a GitHub repository.
#[derive(Debug, Clone)]
pub struct GithubRegistrySource {
    name: String,
    owner: String,
    repo: String,
    branch: String,
    api_url: String,
    raw_url: String,
    client: reqwest::Client,
}

impl GithubRegistrySource {
    /// Creates a source for the configured repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &RegistrySourceConfig) -> RegistryResult<Self> {
        Ok(Self {
            name: config.name.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            api_url: GITHUB_API_URL.to_string(),
            raw_url: GITHUB_RAW_URL.to_string(),
            client: http_client()?,
        })
    }

    /// Points the source at different API and raw file hosts.
    #[must_use]
    pub fn with_base_urls(mut self, api_url: impl Into<String>, raw_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self.raw_url = raw_url.into().trim_end_matches('/').to_string();
        self
    }

    fn unavailable(&self, reason: impl Into<String>) -> RegistryError {
        RegistryError::Unavailable {
            registry: self.name.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl RegistrySource for GithubRegistrySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_plugins(&self) -> RegistryResult<Vec<String>> {
        let url = format!(
            "{}/repos/{}/{}/contents/plugins",
            self.api_url, self.owner, self.repo
        );

        let response = self
            .client
            .get(&url)
            .query(&[("ref", self.branch.as_str())])
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.unavailable(format!("listing plugins returned {status}")));
        }

        let entries: Vec<ContentEntry> = response
            .json()
            .await
            .map_err(|e| self.unavailable(format!("unreadable plugin listing: {e}")))?;

        Ok(entries
            .into_iter()
            .filter(|e| e.entry_type == "dir")
            .map(|e| e.name)
            .collect())
    }

    async fn fetch_manifest(&self, name: &str) -> RegistryResult<RegistryManifest> {
        if !is_valid_plugin_name(name) {
            return Err(RegistryError::InvalidPluginName {
                name: name.to_string(),
            });
        }

        let url = format!(
            "{}/{}/{}/{}/plugins/{name}/manifest.json",
            self.raw_url, self.owner, self.repo, self.branch
        );
        tracing::debug!(registry = %self.name, %url, "fetching manifest");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::PluginNotFound {
                name: name.to_string(),
                registries: vec![self.name.clone()],
            });
        }
        if !status.is_success() {
            return Err(self.unavailable(format!("fetching manifest for {name} returned {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        RegistryManifest::from_json(&body).map_err(|source| RegistryError::MalformedManifest {
            name: name.to_string(),
            registry: self.name.clone(),
            source,
        })
    }
}

/// Builds the runtime source for one configured registry.
///
/// # Errors
///
/// Returns [`RegistryError::UnsupportedSourceType`] for types other than
/// `github`, or an error if the HTTP client cannot be built.
pub fn source_from_config(config: &RegistrySourceConfig) -> RegistryResult<Box<dyn RegistrySource>> {
    match config.source_type.as_str() {
        "github" => Ok(Box::new(GithubRegistrySource::new(config)?)),
        other => Err(RegistryError::UnsupportedSourceType {
            registry: config.name.clone(),
            source_type: other.to_string(),
        }),
    }
}

fn http_client() -> RegistryResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(RegistryError::Client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_source(server: &MockServer) -> GithubRegistrySource {
        let config = RegistrySourceConfig::github("community", "acme", "catalog").with_branch("dev");
        GithubRegistrySource::new(&config)
            .unwrap()
            .with_base_urls(server.uri(), server.uri())
    }

    #[tokio::test]
    async fn test_list_plugins_keeps_directories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/catalog/contents/plugins"))
            .and(query_param("ref", "dev"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "auth", "type": "dir"},
                {"name": "README.md", "type": "file"},
                {"name": "cache", "type": "dir"}
            ])))
            .mount(&server)
            .await;

        let names = test_source(&server).list_plugins().await.unwrap();
        assert_eq!(names, ["auth", "cache"]);
    }

    #[tokio::test]
    async fn test_list_plugins_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/catalog/contents/plugins"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = test_source(&server).list_plugins().await.unwrap_err();
        assert!(matches!(err, RegistryError::Unavailable { ref registry, .. } if registry == "community"));
    }

    #[tokio::test]
    async fn test_list_plugins_unparseable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/catalog/contents/plugins"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_source(&server).list_plugins().await.unwrap_err();
        assert!(matches!(err, RegistryError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_fetch_manifest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/acme/catalog/dev/plugins/auth/manifest.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "auth",
                "version": "1.4.0",
                "type": "builtin",
                "tier": "core"
            })))
            .mount(&server)
            .await;

        let manifest = test_source(&server).fetch_manifest("auth").await.unwrap();
        assert_eq!(manifest.version, "1.4.0");
        assert_eq!(manifest.tier, "core");
    }

    #[tokio::test]
    async fn test_fetch_manifest_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/acme/catalog/dev/plugins/missing/manifest.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/acme/catalog/dev/plugins/flaky/manifest.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/acme/catalog/dev/plugins/broken/manifest.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"name\": "))
            .mount(&server)
            .await;

        let source = test_source(&server);
        assert!(source.fetch_manifest("missing").await.unwrap_err().is_not_found());
        assert!(matches!(
            source.fetch_manifest("flaky").await.unwrap_err(),
            RegistryError::Unavailable { .. }
        ));
        assert!(matches!(
            source.fetch_manifest("broken").await.unwrap_err(),
            RegistryError::MalformedManifest { ref name, .. } if name == "broken"
        ));
    }

    #[tokio::test]
    async fn test_fetch_manifest_rejects_path_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "x"})))
            .expect(0)
            .mount(&server)
            .await;

        let source = test_source(&server);
        for name in ["../x", "a/b", ".."] {
            assert!(matches!(
                source.fetch_manifest(name).await.unwrap_err(),
                RegistryError::InvalidPluginName { .. }
            ));
        }
    }

    #[tokio::test]
    async fn test_search_skips_broken_manifests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/catalog/contents/plugins"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "auth", "type": "dir"},
                {"name": "broken", "type": "dir"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/acme/catalog/dev/plugins/auth/manifest.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "auth",
                "version": "1.0.0",
                "description": "JWT authentication"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/acme/catalog/dev/plugins/broken/manifest.json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let results = test_source(&server).search_plugins("jwt").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name(), "auth");
        assert_eq!(results[0].source, "community");
    }

    #[test]
    fn test_source_from_config_rejects_unknown_type() {
        let mut config = RegistrySourceConfig::github("local", "acme", "catalog");
        config.source_type = "gitlab".to_string();

        let err = source_from_config(&config).err().unwrap();
        assert!(matches!(err, RegistryError::UnsupportedSourceType { ref source_type, .. } if source_type == "gitlab"));
    }

    #[test]
    fn test_source_from_config_github() {
        let config = RegistrySourceConfig::github("default", "acme", "catalog");
        let source = source_from_config(&config).unwrap();
        assert_eq!(source.name(), "default");
    }
}
