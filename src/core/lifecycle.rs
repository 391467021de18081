// ─── Lifecycle Manager ───
// Startup purge and teardown of everything the loader leaves in the host.

use serde::Serialize;
use tracing::{info, warn};

use crate::core::error::{LoaderError, LoaderResult};
use crate::core::packs::PackRegistry;
use crate::core::state::LoaderPaths;

/// What a cleanup pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    pub cache_cleared: bool,
    pub packs_removed: usize,
    pub registry_entries_removed: usize,
}

pub struct LifecycleManager {
    paths: LoaderPaths,
}

impl LifecycleManager {
    pub fn new(paths: LoaderPaths) -> Self {
        Self { paths }
    }

    /// Wipe the internal cache, then everything a previous run registered.
    pub fn startup(&self) -> CleanupSummary {
        info!("Clearing Cache...");
        let internal = self.paths.internal_dir();
        let cache_cleared = match std::fs::remove_dir_all(internal) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Failed to clear cache {:?}: {}", internal, e);
                false
            }
        };
        info!("Clearing Cache Done!");

        CleanupSummary {
            cache_cleared,
            ..self.teardown()
        }
    }

    /// Remove our resource pack directories and registry entries.
    /// Safe to call any number of times.
    pub fn teardown(&self) -> CleanupSummary {
        let packs_removed = self.remove_owned_packs().unwrap_or_else(|e| {
            warn!("Failed to remove resource packs: {}", e);
            0
        });
        let registry = PackRegistry::new(self.paths.registry_file());
        let registry_entries_removed = registry.reset_owned().unwrap_or_else(|e| {
            warn!("Failed to reset {:?}: {}", registry.path(), e);
            0
        });

        CleanupSummary {
            cache_cleared: false,
            packs_removed,
            registry_entries_removed,
        }
    }

    fn remove_owned_packs(&self) -> LoaderResult<usize> {
        let root = self.paths.resource_packs_dir();
        let entries = match std::fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(LoaderError::io(&root, e)),
        };

        let prefix = format!("{}_", self.paths.pack_prefix());
        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| LoaderError::io(&root, e))?;
            let path = entry.path();
            let owned = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(&prefix));
            if !owned || !path.is_dir() {
                continue;
            }
            std::fs::remove_dir_all(&path).map_err(|e| LoaderError::io(&path, e))?;
            info!("Removed resource pack {:?}", path);
            removed += 1;
        }
        Ok(removed)
    }
}
