//! Release asset selection.

use trellis_install::CHECKSUMS_FILE;
use trellis_registry::Platform;

use crate::release::ReleaseAsset;

/// Asset names to look for, most preferred first.
#[must_use]
pub fn candidate_names(binary: &str, platform: &Platform) -> Vec<String> {
    let Platform { os, arch } = platform;

    let mut candidates = Vec::with_capacity(6);
    if platform.is_windows() {
        candidates.push(format!("{binary}-{os}-{arch}.exe"));
        candidates.push(format!("{binary}_{os}_{arch}.exe"));
    }
    candidates.extend([
        format!("{binary}-{os}-{arch}"),
        format!("{binary}-{os}-{arch}.tar.gz"),
        format!("{binary}_{os}_{arch}"),
        format!("{binary}_{os}_{arch}.tar.gz"),
    ]);
    candidates
}

/// Picks the first candidate present in `assets`, ignoring case.
#[must_use]
pub fn find_release_asset<'a>(
    assets: &'a [ReleaseAsset],
    binary: &str,
    platform: &Platform,
) -> Option<&'a ReleaseAsset> {
    candidate_names(binary, platform).iter().find_map(|candidate| {
        assets
            .iter()
            .find(|asset| asset.name.eq_ignore_ascii_case(candidate))
    })
}

/// Returns the release's `checksums.txt`, if any.
#[must_use]
pub fn find_checksum_asset(assets: &[ReleaseAsset]) -> Option<&ReleaseAsset> {
    assets
        .iter()
        .find(|asset| asset.name.eq_ignore_ascii_case(CHECKSUMS_FILE))
}
