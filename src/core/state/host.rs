use std::ffi::c_void;
use std::path::{Path, PathBuf};

use crate::core::assets::LayeredAssets;
use crate::core::error::LoaderResult;

/// What the loader needs from the application it runs inside.
pub trait Host {
    /// Layer an overlay archive above the host's existing assets.
    /// The most recent registration wins on conflicting names.
    fn add_asset_overlay(&mut self, archive: &Path) -> LoaderResult<()>;

    /// Host system native-library directories, searched after package dirs.
    fn system_library_dirs(&self) -> Vec<PathBuf>;

    /// Opaque application handle passed to every entry point.
    fn raw_handle(&self) -> *mut c_void {
        std::ptr::null_mut()
    }
}

/// Host used when the loader runs on its own (the `ncmodloader` binary).
#[derive(Debug, Default)]
pub struct StandaloneHost {
    assets: LayeredAssets,
    extra_library_dirs: Vec<PathBuf>,
}

impl StandaloneHost {
    pub fn new(extra_library_dirs: Vec<PathBuf>) -> Self {
        Self {
            assets: LayeredAssets::default(),
            extra_library_dirs,
        }
    }

    pub fn assets(&self) -> &LayeredAssets {
        &self.assets
    }
}

impl Host for StandaloneHost {
    fn add_asset_overlay(&mut self, archive: &Path) -> LoaderResult<()> {
        self.assets.add_layer(archive)
    }

    fn system_library_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.extra_library_dirs.clone();
        if let Some(raw) = std::env::var_os(library_path_var()) {
            dirs.extend(std::env::split_paths(&raw).filter(|p| !p.as_os_str().is_empty()));
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        dirs.extend(["/lib", "/usr/lib", "/usr/local/lib"].map(PathBuf::from));

        let mut seen = std::collections::HashSet::new();
        dirs.retain(|d| seen.insert(d.clone()));
        dirs
    }
}

fn library_path_var() -> &'static str {
    if cfg!(target_os = "windows") {
        "PATH"
    } else if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else {
        "LD_LIBRARY_PATH"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_dirs_come_first_and_are_not_repeated() {
        let host = StandaloneHost::new(vec![
            PathBuf::from("/opt/host/lib"),
            PathBuf::from("/opt/host/lib"),
        ]);
        let dirs = host.system_library_dirs();
        assert_eq!(dirs[0], PathBuf::from("/opt/host/lib"));
        assert_eq!(
            dirs.iter().filter(|d| **d == PathBuf::from("/opt/host/lib")).count(),
            1
        );
    }
}
