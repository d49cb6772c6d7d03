//! HTTP downloads with a per-client timeout.

use std::time::Duration;

use bytes::Bytes;

use crate::{InstallError, InstallResult};

/// Timeout for plugin and release payloads.
pub const PAYLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Timeout for small companion files such as `checksums.txt`.
pub const SMALL_FILE_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches remote files.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    /// Creates a downloader whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> InstallResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(timeout)
            .build()
            .map_err(InstallError::Client)?;

        Ok(Self { client })
    }

    /// Downloads `url` into memory.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::DownloadFailed`] on transport errors and
    /// non-success statuses.
    pub async fn fetch(&self, url: &str) -> InstallResult<Bytes> {
        tracing::debug!(%url, "downloading");

        let failed = |reason: String| InstallError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failed(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {status}")));
        }

        response
            .bytes()
            .await
            .map_err(|e| failed(format!("failed to read body: {e}")))
    }

    /// Returns `Ok(())` if a HEAD request to `url` succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::DownloadFailed`] if the URL is unreachable.
    pub async fn probe(&self, url: &str) -> InstallResult<()> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| InstallError::DownloadFailed {
                url: url.to_string(),
                reason: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(InstallError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/payload.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
            .mount(&server)
            .await;

        let downloader = Downloader::new(SMALL_FILE_TIMEOUT).unwrap();
        let bytes = downloader
            .fetch(&format!("{}/payload.bin", server.uri()))
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"payload");
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let downloader = Downloader::new(SMALL_FILE_TIMEOUT).unwrap();
        let err = downloader
            .fetch(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::DownloadFailed { ref reason, .. } if reason.contains("404")));
    }

    #[tokio::test]
    async fn test_probe() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        let downloader = Downloader::new(SMALL_FILE_TIMEOUT).unwrap();
        assert!(downloader.probe(&format!("{}/ok", server.uri())).await.is_ok());
        assert!(downloader.probe(&format!("{}/gone", server.uri())).await.is_err());
    }
}
