// ─── Config Reconciler ───
// Mirrors external packages into the internal cache and keeps the persisted
// enable/order config in step with what is actually installed.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::model::{PackageConfigEntry, StoredEntry};
use crate::core::error::{LoaderError, LoaderResult};
use crate::core::package::Package;
use crate::core::state::LoaderPaths;

pub struct ConfigReconciler {
    paths: LoaderPaths,
}

impl ConfigReconciler {
    pub fn new(paths: LoaderPaths) -> Self {
        Self { paths }
    }

    /// Copy every external package into the cache and rebuild the config.
    ///
    /// Prior `enabled`/`order` values survive for packages still present;
    /// new packages get `enabled = true` and their scan position as order;
    /// vanished packages drop out. Only failing to establish the two
    /// directories is an error.
    pub fn reconcile(&self) -> LoaderResult<Vec<PackageConfigEntry>> {
        let external = self.paths.packages_dir();
        let internal = self.paths.cached_packages_dir();
        if ensure_dir(external)? {
            info!("Libs Folder Created!");
        }
        if ensure_dir(&internal)? {
            info!("Internal Libs Folder Created!");
        }

        let discovered = self.discover()?;
        for name in &discovered {
            let from = external.join(name);
            let to = self.paths.cached_package(name);
            match std::fs::copy(&from, &to) {
                Ok(bytes) => debug!("Cached {} ({} bytes)", name, bytes),
                Err(e) => warn!("Failed to cache {:?} -> {:?}: {}", from, to, e),
            }
        }

        let previous: HashMap<String, StoredEntry> = match self.read_config() {
            Ok(Some(entries)) => entries
                .into_iter()
                .map(|entry| (entry.name.clone(), entry))
                .collect(),
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!(
                    "Failed to read old {:?}, will recreate: {}",
                    self.paths.config_file(),
                    e
                );
                HashMap::new()
            }
        };

        let entries: Vec<PackageConfigEntry> = discovered
            .into_iter()
            .enumerate()
            .map(|(position, name)| match previous.get(&name) {
                Some(prior) => PackageConfigEntry {
                    enabled: prior.enabled(),
                    order: prior.order_or(position as i64),
                    name,
                },
                None => PackageConfigEntry {
                    name,
                    enabled: true,
                    order: position as i64,
                },
            })
            .collect();

        self.write_config(&entries)?;
        info!(
            "{:?} updated ({} entries)",
            self.paths.config_file(),
            entries.len()
        );
        Ok(entries)
    }

    /// Enabled packages in ascending `order`, resolved to their cached archives.
    ///
    /// Without a readable config every cached package is returned in name
    /// order, unfiltered.
    pub fn load_ordered(&self) -> Vec<Package> {
        let mut entries = match self.read_config() {
            Ok(Some(entries)) => entries,
            Ok(None) => {
                warn!("Config not found! Loading all cached packages instead.");
                return self.scan_cache();
            }
            Err(e) => {
                warn!("Config unreadable ({}), loading all cached packages instead.", e);
                return self.scan_cache();
            }
        };

        // Stable: equal orders keep document position.
        entries.sort_by_key(|entry| entry.order_or(0));

        entries
            .into_iter()
            .filter(|entry| entry.enabled())
            .filter_map(|entry| {
                let archive = self.paths.cached_package(&entry.name);
                if archive.is_file() {
                    Some(Package::new(entry.name, archive))
                } else {
                    warn!("Skipped -> {} (not found)", entry.name);
                    None
                }
            })
            .collect()
    }

    /// Persisted entries; `None` when there is no config file yet.
    pub fn read_config(&self) -> LoaderResult<Option<Vec<StoredEntry>>> {
        let path = self.paths.config_file();
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LoaderError::io(&path, e)),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn write_config(&self, entries: &[PackageConfigEntry]) -> LoaderResult<()> {
        let path = self.paths.config_file();
        let mut json = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut json, formatter);
        entries.serialize(&mut serializer)?;
        std::fs::write(&path, json).map_err(|e| LoaderError::io(&path, e))
    }

    /// External package names, sorted so order does not depend on the
    /// filesystem's listing order.
    fn discover(&self) -> LoaderResult<Vec<String>> {
        let dir = self.paths.packages_dir();
        let suffix = self.paths.package_suffix();
        let mut names = list_files(dir)?
            .into_iter()
            .filter(|name| name.ends_with(suffix))
            .collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }

    fn scan_cache(&self) -> Vec<Package> {
        let dir = self.paths.cached_packages_dir();
        let suffix = format!(
            "{}{}",
            self.paths.package_suffix(),
            self.paths.cache_suffix()
        );
        let mut names = match list_files(&dir) {
            Ok(names) => names,
            Err(e) => {
                warn!("Cannot scan {:?}: {}", dir, e);
                return Vec::new();
            }
        };
        names.retain(|name| name.ends_with(&suffix));
        names.sort();

        names
            .into_iter()
            .map(|name| Package::from_cached(&dir.join(name), self.paths.cache_suffix()))
            .collect()
    }
}

/// Make sure `path` is a directory, replacing a plain file in the way.
/// Returns whether anything had to be created.
fn ensure_dir(path: &Path) -> LoaderResult<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| LoaderError::io(path, e))?;
    }
    std::fs::create_dir_all(path).map_err(|e| LoaderError::io(path, e))?;
    Ok(true)
}

fn list_files(dir: &Path) -> LoaderResult<Vec<String>> {
    let mut names = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
        Err(e) => return Err(LoaderError::io(dir, e)),
    };
    for entry in entries {
        let entry = entry.map_err(|e| LoaderError::io(dir, e))?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, LoaderPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = LoaderPaths::new(
            dir.path().join("ext"),
            dir.path().join("int"),
            dir.path().join("host"),
        );
        (dir, paths)
    }

    fn install(paths: &LoaderPaths, names: &[&str]) {
        std::fs::create_dir_all(paths.packages_dir()).unwrap();
        for name in names {
            std::fs::write(paths.packages_dir().join(name), format!("zip of {name}")).unwrap();
        }
    }

    #[test]
    fn first_run_creates_default_entries() {
        let (_dir, paths) = setup();
        install(&paths, &["foo.ncm", "notes.txt"]);
        let reconciler = ConfigReconciler::new(paths.clone());

        reconciler.reconcile().unwrap();

        let raw = std::fs::read_to_string(paths.config_file()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([{"name": "foo.ncm", "enabled": true, "order": 0}])
        );
        assert!(raw.contains("\n    {"));
        assert_eq!(
            std::fs::read(paths.cached_package("foo.ncm")).unwrap(),
            b"zip of foo.ncm"
        );
        assert_eq!(
            reconciler.load_ordered(),
            vec![Package::new("foo.ncm", paths.cached_package("foo.ncm"))]
        );
    }

    #[test]
    fn reconcile_is_byte_identical_when_nothing_changed() {
        let (_dir, paths) = setup();
        install(&paths, &["a.ncm", "b.ncm", "c.ncm"]);
        let reconciler = ConfigReconciler::new(paths.clone());

        reconciler.reconcile().unwrap();
        let first = std::fs::read(paths.config_file()).unwrap();
        reconciler.reconcile().unwrap();
        let second = std::fs::read(paths.config_file()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn user_edits_survive_and_vanished_packages_drop() {
        let (_dir, paths) = setup();
        install(&paths, &["a.ncm", "new.ncm"]);
        std::fs::write(
            paths.config_file(),
            r#"[
                {"name": "gone.ncm", "enabled": true, "order": 1},
                {"name": "a.ncm", "enabled": false, "order": 5}
            ]"#,
        )
        .unwrap();

        let entries = ConfigReconciler::new(paths.clone()).reconcile().unwrap();

        assert_eq!(
            entries,
            vec![
                PackageConfigEntry { name: "a.ncm".into(), enabled: false, order: 5 },
                PackageConfigEntry { name: "new.ncm".into(), enabled: true, order: 1 },
            ]
        );
    }

    #[test]
    fn partial_prior_entries_fill_defaults() {
        let (_dir, paths) = setup();
        install(&paths, &["a.ncm", "b.ncm"]);
        std::fs::write(
            paths.config_file(),
            r#"[{"name": "a.ncm"}, {"name": "b.ncm", "enabled": false}]"#,
        )
        .unwrap();

        let entries = ConfigReconciler::new(paths).reconcile().unwrap();

        assert_eq!(entries[0], PackageConfigEntry { name: "a.ncm".into(), enabled: true, order: 0 });
        assert_eq!(entries[1], PackageConfigEntry { name: "b.ncm".into(), enabled: false, order: 1 });
    }

    #[test]
    fn corrupt_config_is_rebuilt() {
        let (_dir, paths) = setup();
        install(&paths, &["a.ncm"]);
        std::fs::write(paths.config_file(), "{{ definitely not json").unwrap();

        let entries = ConfigReconciler::new(paths).reconcile().unwrap();
        assert_eq!(entries, vec![PackageConfigEntry { name: "a.ncm".into(), enabled: true, order: 0 }]);
    }

    #[test]
    fn external_path_that_is_a_file_becomes_a_directory() {
        let (_dir, paths) = setup();
        std::fs::create_dir_all(paths.packages_dir().parent().unwrap()).unwrap();
        std::fs::write(paths.packages_dir(), b"oops").unwrap();

        let entries = ConfigReconciler::new(paths.clone()).reconcile().unwrap();

        assert!(entries.is_empty());
        assert!(paths.packages_dir().is_dir());
        assert!(paths.cached_packages_dir().is_dir());
    }

    #[test]
    fn load_ordered_sorts_filters_and_skips_missing_caches() {
        let (_dir, paths) = setup();
        std::fs::create_dir_all(paths.packages_dir()).unwrap();
        std::fs::create_dir_all(paths.cached_packages_dir()).unwrap();
        for name in ["late.ncm", "early.ncm", "tie.ncm", "off.ncm"] {
            std::fs::write(paths.cached_package(name), b"zip").unwrap();
        }
        std::fs::write(
            paths.config_file(),
            r#"[
                {"name": "late.ncm", "enabled": true, "order": 9},
                {"name": "off.ncm", "enabled": false, "order": 0},
                {"name": "early.ncm", "enabled": true, "order": 2},
                {"name": "tie.ncm", "enabled": true, "order": 2},
                {"name": "uncached.ncm", "enabled": true, "order": 1}
            ]"#,
        )
        .unwrap();

        let names: Vec<String> = ConfigReconciler::new(paths)
            .load_ordered()
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, vec!["early.ncm", "tie.ncm", "late.ncm"]);
    }

    #[test]
    fn load_ordered_without_config_scans_cache() {
        let (_dir, paths) = setup();
        std::fs::create_dir_all(paths.cached_packages_dir()).unwrap();
        for name in ["b.ncm.jar", "a.ncm.jar", "stray.jar"] {
            std::fs::write(paths.cached_packages_dir().join(name), b"zip").unwrap();
        }

        let packages = ConfigReconciler::new(paths.clone()).load_ordered();

        assert_eq!(
            packages,
            vec![
                Package::new("a.ncm", paths.cached_packages_dir().join("a.ncm.jar")),
                Package::new("b.ncm", paths.cached_packages_dir().join("b.ncm.jar")),
            ]
        );
    }
}
