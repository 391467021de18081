// ─── Packages ───
// Identity of a mod package and its declared manifest.

pub mod manifest;

use std::path::{Path, PathBuf};

pub use manifest::{PackageManifest, MANIFEST_ENTRY};

const LEGACY_SUFFIX: &str = ".modplus";

/// A package ready to be loaded: its user-facing name and the archive to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Name as it appears in the external directory, e.g. `foo.ncm`.
    pub name: String,
    /// Cached archive the pipeline reads from.
    pub archive: PathBuf,
}

impl Package {
    pub fn new(name: impl Into<String>, archive: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            archive: archive.into(),
        }
    }

    /// Build a package from a cached archive path by dropping `cache_suffix`
    /// from its file name.
    pub fn from_cached(archive: &Path, cache_suffix: &str) -> Self {
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = file_name
            .strip_suffix(cache_suffix)
            .unwrap_or(&file_name)
            .to_string();
        Self::new(name, archive)
    }

    /// Key for per-package cache directories (natives, code).
    pub fn base_name(&self) -> &str {
        &self.name
    }

    /// Name used for resource packs and registry owner tags.
    pub fn clean_name(&self) -> &str {
        self.name.strip_suffix(LEGACY_SUFFIX).unwrap_or(&self.name)
    }
}
