//! Manifest validation.
//!
//! [`validate_manifest`] is a pure function: it never fails and never touches
//! the network. Every rule runs and errors accumulate, so a single pass reports
//! everything wrong with a manifest.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::RegistryManifest;
use crate::version::compare_versions;

static VERSION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+").unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

/// One problem found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path of the offending field, e.g. `downloads[0].os`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The values accepted for the manifest's enumerated fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestVocabulary {
    pub types: Vec<String>,
    pub tiers: Vec<String>,
    pub oses: Vec<String>,
    pub arches: Vec<String>,
}

impl Default for ManifestVocabulary {
    fn default() -> Self {
        fn owned(values: &[&str]) -> Vec<String> {
            values.iter().map(ToString::to_string).collect()
        }

        Self {
            types: owned(&["builtin", "external"]),
            tiers: owned(&["core", "community"]),
            oses: owned(&["linux", "darwin", "windows"]),
            arches: owned(&["amd64", "arm64"]),
        }
    }
}

/// Knobs for a validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Ask the caller to also probe download URLs. The probe itself happens
    /// outside this module.
    pub verify_urls: bool,
    /// Together with `target_arch`, require an external plugin to ship a
    /// download for this platform. Empty disables the check.
    pub target_os: String,
    pub target_arch: String,
    /// Host engine version to check `minEngineVersion` against. Empty
    /// disables the check.
    pub engine_version: String,
    /// Accepted enum values.
    pub vocabulary: ManifestVocabulary,
}

/// Validates a manifest, returning every problem found.
///
/// An empty result means the manifest is valid.
#[must_use]
pub fn validate_manifest(
    manifest: &RegistryManifest,
    options: &ValidationOptions,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let vocabulary = &options.vocabulary;

    let required = [
        ("name", &manifest.name),
        ("version", &manifest.version),
        ("author", &manifest.author),
        ("description", &manifest.description),
        ("type", &manifest.plugin_type),
        ("tier", &manifest.tier),
        ("license", &manifest.license),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::new(field, "is required"));
        }
    }

    check_enum(&mut errors, "type", &manifest.plugin_type, &vocabulary.types);
    check_enum(&mut errors, "tier", &manifest.tier, &vocabulary.tiers);

    if !manifest.version.trim().is_empty() && !VERSION_PREFIX.is_match(&manifest.version) {
        errors.push(ValidationError::new(
            "version",
            format!(
                "{:?} is not a semantic version (expected MAJOR.MINOR.PATCH)",
                manifest.version
            ),
        ));
    }

    for (i, download) in manifest.downloads.iter().enumerate() {
        let field = |name: &str| format!("downloads[{i}].{name}");

        if !vocabulary.oses.contains(&download.os) {
            errors.push(enum_error(field("os"), &download.os, &vocabulary.oses));
        }
        if !vocabulary.arches.contains(&download.arch) {
            errors.push(enum_error(
                field("arch"),
                &download.arch,
                &vocabulary.arches,
            ));
        }
        if download.url.trim().is_empty() {
            errors.push(ValidationError::new(field("url"), "is required"));
        }
        if !download.sha256.is_empty() && !is_sha256_hex(&download.sha256) {
            errors.push(ValidationError::new(
                field("sha256"),
                "must be 64 hexadecimal characters",
            ));
        }
    }

    if manifest.is_external() && manifest.downloads.is_empty() {
        errors.push(ValidationError::new(
            "downloads",
            "external plugins must list at least one download",
        ));
    }

    if manifest.is_external()
        && !manifest.downloads.is_empty()
        && !options.target_os.is_empty()
        && !options.target_arch.is_empty()
        && manifest
            .find_download(&options.target_os, &options.target_arch)
            .is_err()
    {
        errors.push(ValidationError::new(
            "downloads",
            format!(
                "no download for target platform {}/{}",
                options.target_os, options.target_arch
            ),
        ));
    }

    if !options.engine_version.is_empty()
        && !manifest.min_engine_version.is_empty()
        && compare_versions(&options.engine_version, &manifest.min_engine_version).is_lt()
    {
        errors.push(ValidationError::new(
            "minEngineVersion",
            format!(
                "requires engine {} or newer, but the engine is {}",
                manifest.min_engine_version, options.engine_version
            ),
        ));
    }

    errors
}

/// Enum violations on blank values are already reported as missing.
fn check_enum(errors: &mut Vec<ValidationError>, field: &str, value: &str, allowed: &[String]) {
    if !value.trim().is_empty() && !allowed.iter().any(|a| a == value) {
        errors.push(enum_error(field.to_string(), value, allowed));
    }
}

fn enum_error(field: String, value: &str, allowed: &[String]) -> ValidationError {
    ValidationError::new(
        field,
        format!("{value:?} must be one of: {}", allowed.join(", ")),
    )
}

fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PluginDownload;

    fn valid_manifest() -> RegistryManifest {
        RegistryManifest {
            name: "test-plugin".to_string(),
            version: "1.0.0".to_string(),
            author: "Test Author".to_string(),
            description: "A test plugin".to_string(),
            plugin_type: "external".to_string(),
            tier: "community".to_string(),
            license: "MIT".to_string(),
            downloads: vec![PluginDownload {
                os: "linux".to_string(),
                arch: "amd64".to_string(),
                url: "https://example.com/plugin-linux-amd64.tar.gz".to_string(),
                sha256: String::new(),
            }],
            ..RegistryManifest::default()
        }
    }

    fn fields(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    fn has_field(errors: &[ValidationError], field: &str) -> bool {
        errors.iter().any(|e| e.field == field)
    }

    #[test]
    fn test_valid_manifest() {
        let errors = validate_manifest(&valid_manifest(), &ValidationOptions::default());
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn test_empty_manifest_reports_each_required_field_once() {
        let errors = validate_manifest(&RegistryManifest::default(), &ValidationOptions::default());
        assert_eq!(
            fields(&errors),
            ["name", "version", "author", "description", "type", "tier", "license"]
        );
    }

    #[test]
    fn test_blank_values_reported_once() {
        let mut manifest = valid_manifest();
        manifest.version = "   ".to_string();
        manifest.plugin_type = " ".to_string();

        let errors = validate_manifest(&manifest, &ValidationOptions::default());
        assert_eq!(fields(&errors), ["version", "type"]);
        assert!(errors.iter().all(|e| e.message == "is required"));
    }

    #[test]
    fn test_invalid_enums() {
        let mut manifest = valid_manifest();
        manifest.plugin_type = "invalid-type".to_string();
        manifest.tier = "invalid-tier".to_string();

        let errors = validate_manifest(&manifest, &ValidationOptions::default());
        assert!(has_field(&errors, "type"));
        assert!(has_field(&errors, "tier"));
    }

    #[test]
    fn test_version_format() {
        let cases = [
            ("1.0.0", false),
            ("0.2.18", false),
            ("10.100.1000", false),
            ("1.0.0-beta", false),
            ("1.0", true),
            ("abc", true),
        ];

        for (version, want_err) in cases {
            let mut manifest = valid_manifest();
            manifest.version = version.to_string();
            let errors = validate_manifest(&manifest, &ValidationOptions::default());
            assert_eq!(has_field(&errors, "version"), want_err, "version {version:?}");
        }
    }

    #[test]
    fn test_empty_version_reported_once() {
        let mut manifest = valid_manifest();
        manifest.version = String::new();
        let errors = validate_manifest(&manifest, &ValidationOptions::default());
        assert_eq!(fields(&errors), ["version"]);
    }

    #[test]
    fn test_download_fields() {
        let mut manifest = valid_manifest();
        manifest.downloads[0].os = "freebsd".to_string();
        manifest.downloads[0].arch = "386".to_string();
        manifest.downloads[0].url = String::new();

        let errors = validate_manifest(&manifest, &ValidationOptions::default());
        assert_eq!(
            fields(&errors),
            ["downloads[0].os", "downloads[0].arch", "downloads[0].url"]
        );
    }

    #[test]
    fn test_external_without_downloads() {
        let mut manifest = valid_manifest();
        manifest.downloads.clear();
        let errors = validate_manifest(&manifest, &ValidationOptions::default());
        assert!(has_field(&errors, "downloads"));

        // Still reported when everything else is broken too.
        let broken = RegistryManifest {
            plugin_type: "external".to_string(),
            ..RegistryManifest::default()
        };
        let errors = validate_manifest(&broken, &ValidationOptions::default());
        assert!(has_field(&errors, "downloads"));
    }

    #[test]
    fn test_builtin_without_downloads() {
        let mut manifest = valid_manifest();
        manifest.plugin_type = "builtin".to_string();
        manifest.downloads.clear();
        let errors = validate_manifest(&manifest, &ValidationOptions::default());
        assert!(!has_field(&errors, "downloads"));
    }

    #[test]
    fn test_sha256_format() {
        let cases = [
            (
                "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
                false,
            ),
            (
                "2CF24DBA5FB0A30E26E83B2AC5B9E29E1B161E5C1FA7425E73043362938B9824",
                false,
            ),
            ("", false),
            ("abc123", true),
            (
                "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz",
                true,
            ),
            (
                "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b98240",
                true,
            ),
        ];

        for (sha256, want_err) in cases {
            let mut manifest = valid_manifest();
            manifest.downloads[0].sha256 = sha256.to_string();
            let errors = validate_manifest(&manifest, &ValidationOptions::default());
            assert_eq!(
                has_field(&errors, "downloads[0].sha256"),
                want_err,
                "sha256 {sha256:?}"
            );
        }
    }

    #[test]
    fn test_engine_version() {
        let cases = [
            ("2.0.0", "1.9.0", true),
            ("1.0.0", "1.0.0", false),
            ("1.0.0", "2.0.0", false),
            ("99.0.0", "", false),
        ];

        for (min_engine, engine, want_err) in cases {
            let mut manifest = valid_manifest();
            manifest.min_engine_version = min_engine.to_string();
            let options = ValidationOptions {
                engine_version: engine.to_string(),
                ..ValidationOptions::default()
            };
            let errors = validate_manifest(&manifest, &options);
            assert_eq!(
                has_field(&errors, "minEngineVersion"),
                want_err,
                "min {min_engine:?} engine {engine:?}"
            );
        }
    }

    #[test]
    fn test_target_platform() {
        let manifest = valid_manifest();
        let options = ValidationOptions {
            target_os: "darwin".to_string(),
            target_arch: "arm64".to_string(),
            ..ValidationOptions::default()
        };
        let errors = validate_manifest(&manifest, &options);
        assert!(has_field(&errors, "downloads"));

        let options = ValidationOptions {
            target_os: "linux".to_string(),
            target_arch: "amd64".to_string(),
            ..ValidationOptions::default()
        };
        assert!(validate_manifest(&manifest, &options).is_empty());
    }

    #[test]
    fn test_extended_vocabulary() {
        let mut manifest = valid_manifest();
        manifest.tier = "premium".to_string();

        let mut options = ValidationOptions::default();
        assert!(has_field(&validate_manifest(&manifest, &options), "tier"));

        options.vocabulary.tiers.push("premium".to_string());
        assert!(validate_manifest(&manifest, &options).is_empty());
    }
}
