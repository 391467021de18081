use std::path::{Path, PathBuf};

use super::settings::{default_data_dir, LoaderSettings};

pub const CONFIG_FILE: &str = "ncmodloader_config.json";
const REGISTRY_RELATIVE: &str = "games/com.mojang/minecraftpe/global_resource_packs.json";

/// Every directory and file the loader touches, resolved once from settings.
#[derive(Debug, Clone)]
pub struct LoaderPaths {
    packages_dir: PathBuf,
    internal_dir: PathBuf,
    host_data_dir: PathBuf,
    package_suffix: String,
    cache_suffix: String,
    pack_prefix: String,
}

impl LoaderPaths {
    pub fn from_settings(settings: &LoaderSettings) -> Self {
        let data_dir = default_data_dir();
        Self {
            packages_dir: settings
                .packages_dir
                .clone()
                .unwrap_or_else(|| data_dir.join("mods")),
            internal_dir: settings
                .internal_dir
                .clone()
                .unwrap_or_else(|| data_dir.join("internal")),
            host_data_dir: settings
                .host_data_dir
                .clone()
                .unwrap_or_else(|| data_dir.join("host")),
            package_suffix: settings.package_suffix.clone(),
            cache_suffix: settings.cache_suffix.clone(),
            pack_prefix: settings.pack_prefix.clone(),
        }
    }

    /// Paths rooted at explicit directories with default naming.
    pub fn new(packages_dir: PathBuf, internal_dir: PathBuf, host_data_dir: PathBuf) -> Self {
        let settings = LoaderSettings {
            packages_dir: Some(packages_dir),
            internal_dir: Some(internal_dir),
            host_data_dir: Some(host_data_dir),
            ..LoaderSettings::default()
        };
        Self::from_settings(&settings)
    }

    /// External directory scanned for packages.
    pub fn packages_dir(&self) -> &Path {
        &self.packages_dir
    }

    /// Internal cache root. Deleted wholesale on startup.
    pub fn internal_dir(&self) -> &Path {
        &self.internal_dir
    }

    pub fn host_data_dir(&self) -> &Path {
        &self.host_data_dir
    }

    /// Cached copies of external packages.
    pub fn cached_packages_dir(&self) -> PathBuf {
        self.internal_dir.join("mods")
    }

    pub fn natives_dir(&self, base_name: &str) -> PathBuf {
        self.internal_dir.join("natives").join(base_name)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.internal_dir.join("assets")
    }

    /// Private working area of a package's code-loading context.
    pub fn code_dir(&self, base_name: &str) -> PathBuf {
        self.internal_dir.join("code").join(base_name)
    }

    /// Persisted enable/order config, next to the packages users manage.
    pub fn config_file(&self) -> PathBuf {
        self.packages_dir.join(CONFIG_FILE)
    }

    pub fn resource_packs_dir(&self) -> PathBuf {
        self.host_data_dir.join("resource_packs")
    }

    /// Directory a package's resource pack is extracted to.
    pub fn resource_pack_dir(&self, clean_name: &str) -> PathBuf {
        self.resource_packs_dir()
            .join(format!("{}_{}", self.pack_prefix, clean_name))
    }

    /// Host-owned registry of active global resource packs.
    pub fn registry_file(&self) -> PathBuf {
        self.host_data_dir.join(REGISTRY_RELATIVE)
    }

    /// Suffix of packages in the external directory, e.g. `.ncm`.
    pub fn package_suffix(&self) -> &str {
        &self.package_suffix
    }

    /// Extra suffix given to cached copies, e.g. `.jar`.
    pub fn cache_suffix(&self) -> &str {
        &self.cache_suffix
    }

    /// Name prefix marking resource pack directories as ours.
    pub fn pack_prefix(&self) -> &str {
        &self.pack_prefix
    }

    /// Where the cached copy of external package `name` lives.
    pub fn cached_package(&self, name: &str) -> PathBuf {
        self.cached_packages_dir()
            .join(format!("{}{}", name, self.cache_suffix))
    }
}
