//! SHA-256 verification and `checksums.txt` parsing.

use sha2::{Digest, Sha256};

use crate::{InstallError, InstallResult};

/// File name of the companion checksums asset.
pub const CHECKSUMS_FILE: &str = "checksums.txt";

/// Returns the lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Checks `bytes` against an expected hex digest, ignoring case.
///
/// # Errors
///
/// Returns [`InstallError::IntegrityCheckFailed`] on mismatch.
pub fn verify_sha256(bytes: &[u8], expected: &str, subject: &str) -> InstallResult<()> {
    let actual = sha256_hex(bytes);
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(InstallError::IntegrityCheckFailed {
            subject: subject.to_string(),
            expected: expected.trim().to_lowercase(),
            actual,
        })
    }
}

/// Parsed `checksums.txt`: `<digest> <file name>` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: Vec<(String, String)>,
}

impl ChecksumManifest {
    /// Parses checksum lines. Lines without exactly two fields are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                match (fields.next(), fields.next(), fields.next()) {
                    (Some(digest), Some(file), None) => Some((digest.to_string(), file.to_string())),
                    _ => None,
                }
            })
            .collect();

        Self { entries }
    }

    /// Returns the digest listed for `file_name`, matched case-insensitively.
    #[must_use]
    pub fn lookup(&self, file_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, file)| file.eq_ignore_ascii_case(file_name))
            .map(|(digest, _)| digest.as_str())
    }

    /// Verifies `bytes` against the digest listed for `file_name`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::ChecksumNotListed`] if the file has no line, or
    /// [`InstallError::IntegrityCheckFailed`] on mismatch.
    pub fn verify(&self, file_name: &str, bytes: &[u8]) -> InstallResult<()> {
        let expected = self
            .lookup(file_name)
            .ok_or_else(|| InstallError::ChecksumNotListed {
                asset: file_name.to_string(),
            })?;
        verify_sha256(bytes, expected, file_name)
    }
}
