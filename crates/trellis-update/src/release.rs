//! Latest-release lookups against the GitHub releases API.

use std::time::Duration;

use serde::Deserialize;
use trellis_registry::strip_tag_prefix;

use crate::{UpdateError, UpdateResult};

/// Default GitHub REST API endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Repository that publishes Trellis releases.
pub const RELEASE_OWNER: &str = "trellis-dev";
pub const RELEASE_REPO: &str = "trellis";

const FEED_TIMEOUT: Duration = Duration::from_secs(5);

/// The latest published release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
    /// Human-readable release page.
    #[serde(default)]
    pub html_url: String,
}

impl Release {
    /// Returns the tag without its `v` prefix.
    #[must_use]
    pub fn version(&self) -> &str {
        strip_tag_prefix(&self.tag_name)
    }
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Queries the release feed.
#[derive(Debug, Clone)]
pub struct ReleaseFeed {
    url: String,
    client: reqwest::Client,
}

impl ReleaseFeed {
    /// Creates a feed for the Trellis repository.
    ///
    /// `user_agent` identifies the running client, e.g. `trellis/1.2.0`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(user_agent: &str) -> UpdateResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(FEED_TIMEOUT)
            .build()
            .map_err(UpdateError::Client)?;

        Ok(Self {
            url: latest_release_url(GITHUB_API_URL, RELEASE_OWNER, RELEASE_REPO),
            client,
        })
    }

    /// Queries a different API host.
    #[must_use]
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.url = latest_release_url(api_url, RELEASE_OWNER, RELEASE_REPO);
        self
    }

    /// Fetches the latest release.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::ReleaseFeed`] on transport errors, non-200
    /// statuses or unparseable bodies, and [`UpdateError::NoReleases`] if
    /// the release has no tag.
    pub async fn latest(&self) -> UpdateResult<Release> {
        let feed_error = |reason: String| UpdateError::ReleaseFeed { reason };

        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .map_err(|e| feed_error(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(feed_error(format!("GitHub API returned {status}")));
        }

        let release: Release = response
            .json()
            .await
            .map_err(|e| feed_error(format!("failed to parse response: {e}")))?;

        if release.tag_name.is_empty() {
            return Err(UpdateError::NoReleases);
        }
        Ok(release)
    }
}

fn latest_release_url(api_url: &str, owner: &str, repo: &str) -> String {
    format!(
        "{}/repos/{owner}/{repo}/releases/latest",
        api_url.trim_end_matches('/')
    )
}
