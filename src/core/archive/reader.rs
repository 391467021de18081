// ─── Archive Reader ───
// Reads the manifest and named subtrees out of a package archive.

use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::core::error::{LoaderError, LoaderResult};
use crate::core::package::{PackageManifest, MANIFEST_ENTRY};

/// Largest entry `read_entry` buffers in memory.
pub const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;
const SIZE_HINT_CAP: u64 = 64 * 1024;

/// How a subtree is laid out under its destination.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Drop the prefix from written paths (`lib/a.so` -> `a.so`).
    pub strip_prefix: bool,
    /// Recreate directory entries, not only the directories files need.
    pub keep_dirs: bool,
    /// Relative names (after stripping) to leave out, compared ignoring case.
    pub exclude: Vec<String>,
}

/// Result of pulling a subtree out of an archive.
#[derive(Debug, Default)]
pub struct Extraction {
    /// At least one archive entry sat under the prefix.
    pub found: bool,
    /// Files written, as final destination paths.
    pub files: Vec<PathBuf>,
}

/// An opened package archive.
pub struct PackageArchive {
    path: PathBuf,
    zip: ZipArchive<File>,
}

impl PackageArchive {
    pub fn open(path: &Path) -> LoaderResult<Self> {
        let file = File::open(path).map_err(|e| LoaderError::io(path, e))?;
        let zip = ZipArchive::new(file)?;
        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Read one entry fully. `None` when the archive has no such entry.
    pub fn read_entry(&mut self, name: &str) -> LoaderResult<Option<Vec<u8>>> {
        let mut entry = match self.zip.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // The declared size is only a hint: archive headers can claim anything.
        let mut bytes = Vec::with_capacity(entry.size().min(SIZE_HINT_CAP) as usize);
        (&mut entry)
            .take(MAX_ENTRY_BYTES + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| LoaderError::io(&self.path, e))?;
        if bytes.len() as u64 > MAX_ENTRY_BYTES {
            return Err(LoaderError::Other(format!(
                "Entry {} in {:?} is larger than {} bytes",
                name, self.path, MAX_ENTRY_BYTES
            )));
        }
        Ok(Some(bytes))
    }

    /// Parse `manifest.json` from the archive root. `None` when it is absent.
    pub fn read_manifest(&mut self) -> LoaderResult<Option<PackageManifest>> {
        let name = self.display_name();
        match self.read_entry(MANIFEST_ENTRY)? {
            Some(bytes) => PackageManifest::parse(&name, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Extract every entry under `prefix` into `dest`.
    ///
    /// Entries are written to a staging directory next to `dest` first and only
    /// moved into place once the whole subtree is out. When nothing matches,
    /// `dest` is left untouched and `found` is false.
    pub fn extract_subtree(
        &mut self,
        prefix: &str,
        dest: &Path,
        options: &ExtractOptions,
    ) -> LoaderResult<Extraction> {
        let parent = dest
            .parent()
            .ok_or_else(|| LoaderError::Other(format!("No parent for {:?}", dest)))?;
        std::fs::create_dir_all(parent).map_err(|e| LoaderError::io(parent, e))?;

        let staging = tempfile::Builder::new()
            .prefix(&staging_prefix(dest))
            .tempdir_in(parent)
            .map_err(|e| LoaderError::io(parent, e))?;

        let staged = self.extract_into(prefix, staging.path(), options)?;
        if !staged.found {
            return Ok(staged);
        }

        let mut files = Vec::with_capacity(staged.files.len());
        promote(staging.path(), dest, &mut files)?;
        Ok(Extraction { found: true, files })
    }

    /// Extract every entry under `prefix` straight into `dest`, creating it and
    /// any intermediate directories as needed.
    pub fn extract_into(
        &mut self,
        prefix: &str,
        dest: &Path,
        options: &ExtractOptions,
    ) -> LoaderResult<Extraction> {
        let prefix = normalize_prefix(prefix);
        let mut extraction = Extraction::default();

        for i in 0..self.zip.len() {
            let mut entry = self.zip.by_index(i)?;
            let name = entry.name().to_string();
            if !name.starts_with(&prefix) {
                continue;
            }
            extraction.found = true;

            let relative = if options.strip_prefix {
                &name[prefix.len()..]
            } else {
                name.as_str()
            };
            let trimmed = relative.trim_end_matches('/');
            if trimmed.is_empty()
                || options
                    .exclude
                    .iter()
                    .any(|skip| skip.eq_ignore_ascii_case(trimmed))
            {
                continue;
            }

            let Some(relative_path) = safe_relative(trimmed) else {
                warn!("Refusing unsafe entry {:?} in {:?}", name, self.path);
                continue;
            };
            let out = dest.join(relative_path);

            if entry.is_dir() {
                if options.keep_dirs {
                    std::fs::create_dir_all(&out).map_err(|e| LoaderError::io(&out, e))?;
                }
                continue;
            }

            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent).map_err(|e| LoaderError::io(parent, e))?;
            }
            let mut file = File::create(&out).map_err(|e| LoaderError::io(&out, e))?;
            std::io::copy(&mut entry, &mut file).map_err(|e| LoaderError::io(&out, e))?;
            debug!("Extracted {} -> {:?}", name, out);
            extraction.files.push(out);
        }

        Ok(extraction)
    }
}

/// Staging directories are named after their destination, so whatever removes
/// `dest` by name prefix also removes one left behind by a crash.
pub(crate) fn staging_prefix(dest: &Path) -> String {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}.staging-", name)
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    format!("{}/", trimmed)
}

/// Accept only plain relative paths: no root, no `..`, no drive prefixes.
fn safe_relative(name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Move everything under `staged` into `dest`, merging with what is there.
fn promote(staged: &Path, dest: &Path, files: &mut Vec<PathBuf>) -> LoaderResult<()> {
    std::fs::create_dir_all(dest).map_err(|e| LoaderError::io(dest, e))?;

    let entries = std::fs::read_dir(staged).map_err(|e| LoaderError::io(staged, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| LoaderError::io(staged, e))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| LoaderError::io(&from, e))?;

        if file_type.is_dir() {
            promote(&from, &to, files)?;
        } else {
            if to.is_dir() {
                std::fs::remove_dir_all(&to).map_err(|e| LoaderError::io(&to, e))?;
            }
            std::fs::rename(&from, &to).map_err(|e| LoaderError::io(&to, e))?;
            files.push(to);
        }
    }

    Ok(())
}
