//! Version comparison for manifests and release tags.

use std::cmp::Ordering;

/// Compares two `MAJOR.MINOR.PATCH` version strings by value.
///
/// Only the three numeric components take part in the comparison; any
/// pre-release or build suffix is ignored. Missing or non-numeric components
/// count as zero.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    numeric_triplet(a).cmp(&numeric_triplet(b))
}

/// Returns `true` if `candidate` is strictly newer than `current`.
#[must_use]
pub fn is_newer(candidate: &str, current: &str) -> bool {
    compare_versions(candidate, current) == Ordering::Greater
}

/// Strips the optional leading `v` of a release tag.
#[must_use]
pub fn strip_tag_prefix(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}

fn numeric_triplet(version: &str) -> (u64, u64, u64) {
    let version = version.trim();
    if let Ok(parsed) = semver::Version::parse(version) {
        return (parsed.major, parsed.minor, parsed.patch);
    }

    let mut parts = version.splitn(3, '.').map(leading_number);
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}

fn leading_number(segment: &str) -> u64 {
    let end = segment
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(segment.len());
    segment[..end].parse().unwrap_or(0)
}
