//! Reachability checks for manifest download URLs.

use futures::future::join_all;
use trellis_registry::{RegistryManifest, ValidationError};

use crate::download::{Downloader, SMALL_FILE_TIMEOUT};
use crate::InstallResult;

/// Sends a HEAD request to every non-empty download URL and reports each
/// unreachable one as a `downloads[i].url` error.
///
/// # Errors
///
/// Returns an error only if the HTTP client cannot be built.
pub async fn verify_download_urls(manifest: &RegistryManifest) -> InstallResult<Vec<ValidationError>> {
    let downloader = Downloader::new(SMALL_FILE_TIMEOUT)?;

    let probes = manifest
        .downloads
        .iter()
        .enumerate()
        .filter(|(_, d)| !d.url.trim().is_empty())
        .map(|(i, d)| {
            let downloader = &downloader;
            async move { (i, downloader.probe(&d.url).await) }
        });

    let errors = join_all(probes)
        .await
        .into_iter()
        .filter_map(|(i, result)| {
            result.err().map(|e| {
                ValidationError::new(format!("downloads[{i}].url"), format!("unreachable: {e}"))
            })
        })
        .collect();

    Ok(errors)
}
