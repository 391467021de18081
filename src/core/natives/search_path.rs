// ─── Native Search Path ───
// Ordered native-library directories of one code-loading context.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Package directories first (most recently injected at the head), then the
/// host's system directories. `index` is derived from both and rebuilt on
/// every change: library file name -> first match in search order.
#[derive(Debug, Clone, Default)]
pub struct NativeSearchPath {
    package_dirs: Vec<PathBuf>,
    system_dirs: Vec<PathBuf>,
    index: HashMap<OsString, PathBuf>,
}

impl NativeSearchPath {
    pub fn new(system_dirs: Vec<PathBuf>) -> Self {
        let mut search_path = Self {
            package_dirs: Vec::new(),
            system_dirs,
            index: HashMap::new(),
        };
        search_path.rebuild();
        search_path
    }

    /// Put `dir` at the head of the search order, evicting an equal entry.
    pub fn inject(&mut self, dir: &Path) {
        self.package_dirs.retain(|existing| existing != dir);
        self.package_dirs.insert(0, dir.to_path_buf());
        self.rebuild();
        debug!("Injected native dir {:?}", dir);
    }

    pub fn package_dirs(&self) -> &[PathBuf] {
        &self.package_dirs
    }

    /// Full search order: package dirs, then system dirs not already listed.
    pub fn directories(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = self.package_dirs.iter().map(PathBuf::as_path).collect();
        for dir in &self.system_dirs {
            if !self.package_dirs.contains(dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    /// Resolve a library by exact file name, then by its platform file name
    /// (`foo` -> `libfoo.so` / `foo.dll` / `libfoo.dylib`).
    pub fn find_library(&self, name: &str) -> Option<&Path> {
        self.index
            .get(&OsString::from(name))
            .or_else(|| self.index.get(&libloading::library_filename(name)))
            .map(PathBuf::as_path)
    }

    fn rebuild(&mut self) {
        let mut index = HashMap::new();
        for dir in self.directories() {
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    continue;
                }
                index.entry(entry.file_name()).or_insert(path);
            }
        }
        self.index = index;
    }
}
