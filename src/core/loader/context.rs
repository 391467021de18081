use std::path::{Path, PathBuf};

use crate::core::natives::NativeSearchPath;
use crate::core::package::Package;

/// Isolated code-loading context for one package.
///
/// Rooted at the package archive, with a private working directory for
/// whatever the code loader has to materialize on disk, and its own native
/// search path. Symbols the host exports stay visible through the process'
/// global namespace, which acts as the parent context.
#[derive(Debug)]
pub struct ModuleContext {
    package: Package,
    work_dir: PathBuf,
    search_path: NativeSearchPath,
}

impl ModuleContext {
    pub fn new(package: Package, work_dir: PathBuf, system_library_dirs: Vec<PathBuf>) -> Self {
        Self {
            package,
            work_dir,
            search_path: NativeSearchPath::new(system_library_dirs),
        }
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn archive(&self) -> &Path {
        &self.package.archive
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn search_path(&self) -> &NativeSearchPath {
        &self.search_path
    }

    /// Make libraries in `dir` resolvable ahead of everything else.
    pub fn inject_native_dir(&mut self, dir: &Path) {
        self.search_path.inject(dir);
    }

    pub fn find_library(&self, name: &str) -> Option<&Path> {
        self.search_path.find_library(name)
    }
}
