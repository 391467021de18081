use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

const APP_DIR_NAME: &str = "NCModloader";
const HOME_ENV: &str = "NCMODLOADER_HOME";
pub const SETTINGS_FILE: &str = "ncmodloader_settings.json";

/// User-editable loader settings, persisted as `ncmodloader_settings.json`.
///
/// Every field is optional on disk; missing values fall back to the defaults
/// derived from the loader data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// External directory users drop `.ncm` packages into.
    pub packages_dir: Option<PathBuf>,
    /// Private cache root, wiped on every startup.
    pub internal_dir: Option<PathBuf>,
    /// Host data root holding `resource_packs/` and the global pack registry.
    pub host_data_dir: Option<PathBuf>,
    pub package_suffix: String,
    pub cache_suffix: String,
    pub pack_prefix: String,
    /// Extra host system native-library directories, searched after packages.
    pub system_library_dirs: Vec<PathBuf>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            packages_dir: None,
            internal_dir: None,
            host_data_dir: None,
            package_suffix: ".ncm".into(),
            cache_suffix: ".jar".into(),
            pack_prefix: "ncmodloader".into(),
            system_library_dirs: Vec::new(),
        }
    }
}

impl LoaderSettings {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Corrupt settings at {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

/// Root directory for everything the loader owns by default.
pub fn default_data_dir() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return PathBuf::from(home);
    }

    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub fn default_settings_path() -> PathBuf {
    default_data_dir().join(SETTINGS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let settings: LoaderSettings =
            serde_json::from_str(r#"{ "packages_dir": "/sdcard/mods" }"#).unwrap();
        assert_eq!(settings.packages_dir, Some(PathBuf::from("/sdcard/mods")));
        assert_eq!(settings.package_suffix, ".ncm");
        assert_eq!(settings.cache_suffix, ".jar");
        assert_eq!(settings.pack_prefix, "ncmodloader");
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let settings = LoaderSettings::load(&path);
        assert!(settings.packages_dir.is_none());
        assert_eq!(settings.package_suffix, ".ncm");
    }

    #[test]
    fn save_then_load_keeps_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = LoaderSettings {
            pack_prefix: "custom".into(),
            ..LoaderSettings::default()
        };
        settings.save(&path).unwrap();

        assert_eq!(LoaderSettings::load(&path).pack_prefix, "custom");
    }
}
