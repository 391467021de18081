// ─── Package Manifest ───
// The `manifest.json` every package carries at its archive root.

use serde::{Deserialize, Serialize};

use crate::core::error::{LoaderError, LoaderResult};

pub const MANIFEST_ENTRY: &str = "manifest.json";

/// Declared entry point and capabilities of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Entry unit, e.g. `com.example.HelloMod`. Required.
    #[serde(default)]
    pub main: Option<String>,
    /// Package ships native libraries under `lib/`.
    #[serde(default)]
    pub native: bool,
    /// Package overlays host assets from `assets/`.
    #[serde(default)]
    pub assets_override: bool,
    /// Package ships a resource pack under `custom_pack/`.
    #[serde(default)]
    pub custom_pack: bool,
}

impl PackageManifest {
    pub fn parse(package: &str, bytes: &[u8]) -> LoaderResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| LoaderError::ManifestInvalid {
            package: package.to_string(),
            reason: e.to_string(),
        })
    }

    /// The entry unit, or `ManifestInvalid` when `main` is absent or blank.
    pub fn entry(&self, package: &str) -> LoaderResult<&str> {
        match self.main.as_deref().map(str::trim) {
            Some(main) if !main.is_empty() => Ok(main),
            _ => Err(LoaderError::ManifestInvalid {
                package: package.to_string(),
                reason: "'main' not found in manifest.json".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_flags_default_to_false() {
        let manifest = PackageManifest::parse("a.ncm", br#"{ "main": "com.example.A" }"#).unwrap();
        assert_eq!(manifest.entry("a.ncm").unwrap(), "com.example.A");
        assert!(!manifest.native);
        assert!(!manifest.assets_override);
        assert!(!manifest.custom_pack);
    }

    #[test]
    fn missing_main_is_invalid() {
        let manifest = PackageManifest::parse("a.ncm", br#"{ "native": true }"#).unwrap();
        assert!(manifest.native);
        assert!(matches!(
            manifest.entry("a.ncm"),
            Err(LoaderError::ManifestInvalid { .. })
        ));
    }

    #[test]
    fn malformed_json_is_invalid() {
        assert!(matches!(
            PackageManifest::parse("a.ncm", b"{ main: "),
            Err(LoaderError::ManifestInvalid { .. })
        ));
    }
}
