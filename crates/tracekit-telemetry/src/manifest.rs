//! The instrumentation manifest (§6): a static-analysis artifact describing
//! which external packages are patched and under which version ranges.
//! Generation (build-time package scanning) is out of scope; this module
//! owns the manifest's shape and the pure data transforms applied to it.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstrumentationEntry {
    pub package_name: String,
    pub supported_versions: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstrumentationManifest {
    pub sdk_version: String,
    pub language: String,
    pub generated_at: String,
    pub instrumentations: Vec<InstrumentationEntry>,
}

impl InstrumentationManifest {
    pub fn new(sdk_version: impl Into<String>, generated_at: impl Into<String>) -> Self {
        Self {
            sdk_version: sdk_version.into(),
            language: "rust".to_string(),
            generated_at: generated_at.into(),
            instrumentations: Vec::new(),
        }
    }
}

/// Rewrite a patched path that resolves to a submodule of a published
/// package (e.g. `some-pkg/dist/internal/client.js`) to that package's
/// public name. Paths with no `/` are assumed to already be public names.
pub fn rewrite_to_public_name(path: &str, known_packages: &[&str]) -> String {
    known_packages
        .iter()
        .find(|pkg| path == **pkg || path.starts_with(&format!("{pkg}/")))
        .map(|pkg| pkg.to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Merge version ranges for the same package collected from multiple
/// instrumentation sources into one deduplicated, order-preserving list.
pub fn merge_supported_versions(sources: &[Vec<String>]) -> Vec<String> {
    let mut merged = Vec::new();
    for ranges in sources {
        for range in ranges {
            if !merged.contains(range) {
                merged.push(range.clone());
            }
        }
    }
    merged
}

/// Merge a list of manifests collected from separate instrumentation
/// sources into one, unioning version ranges for entries sharing a
/// `package_name` and otherwise concatenating entries.
pub fn merge_manifests(manifests: &[InstrumentationManifest]) -> Vec<InstrumentationEntry> {
    let mut by_package: Vec<InstrumentationEntry> = Vec::new();
    for manifest in manifests {
        for entry in &manifest.instrumentations {
            if let Some(existing) = by_package.iter_mut().find(|e| e.package_name == entry.package_name) {
                existing.supported_versions =
                    merge_supported_versions(&[existing.supported_versions.clone(), entry.supported_versions.clone()]);
            } else {
                by_package.push(entry.clone());
            }
        }
    }
    by_package
}
