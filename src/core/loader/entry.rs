// ─── Entry Points ───
// The C ABI between the loader and package code, and the code loaders that
// resolve and call it.

use std::ffi::{c_char, c_void, CStr};
use std::path::PathBuf;

use libloading::Library;
use tracing::debug;

use super::context::ModuleContext;
use crate::core::archive::PackageArchive;
use crate::core::error::{LoaderError, LoaderResult};

/// Symbol every entry library exports.
pub const ENTRY_SYMBOL: &[u8] = b"onLoad\0";
pub const ENTRY_ABI_VERSION: u32 = 1;
/// Archive directory holding entry libraries.
pub const CODE_PREFIX: &str = "code/";

/// Signature of `onLoad`.
pub type EntryFn = unsafe extern "C" fn(context: *const EntryContext);

/// Signature of the `find_library` callback handed to entry points.
///
/// Writes the NUL-terminated path of library `name` into `buf` when it fits
/// and returns the length that needs (terminator included); 0 when `name`
/// cannot be resolved.
pub type FindLibraryFn = unsafe extern "C" fn(
    module: *const c_void,
    name: *const c_char,
    buf: *mut c_char,
    buf_len: usize,
) -> usize;

/// What `onLoad` receives. Valid for the duration of the call only; `module`
/// stays valid for the lifetime of the loader.
#[repr(C)]
#[derive(Debug)]
pub struct EntryContext {
    pub abi_version: u32,
    /// The host application handle.
    pub host: *mut c_void,
    /// Opaque pointer to the package's `ModuleContext`.
    pub module: *const c_void,
    pub find_library: FindLibraryFn,
}

impl EntryContext {
    pub fn new(host: *mut c_void, module: &ModuleContext) -> Self {
        Self {
            abi_version: ENTRY_ABI_VERSION,
            host,
            module: module as *const ModuleContext as *const c_void,
            find_library: find_library_callback,
        }
    }
}

unsafe extern "C" fn find_library_callback(
    module: *const c_void,
    name: *const c_char,
    buf: *mut c_char,
    buf_len: usize,
) -> usize {
    if module.is_null() || name.is_null() {
        return 0;
    }
    // SAFETY: `module` comes from `EntryContext::new` and the loader keeps the
    // context alive; `name` is a caller-provided C string.
    let module = unsafe { &*(module as *const ModuleContext) };
    let Ok(name) = unsafe { CStr::from_ptr(name) }.to_str() else {
        return 0;
    };
    let Some(path) = module.find_library(name) else {
        return 0;
    };

    let path = path.to_string_lossy();
    let bytes = path.as_bytes();
    let needed = bytes.len() + 1;
    if !buf.is_null() && buf_len >= needed {
        // SAFETY: the caller guarantees `buf` holds `buf_len` bytes.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf as *mut u8, bytes.len());
            *buf.add(bytes.len()) = 0;
        }
    }
    needed
}

/// Resolves an entry unit inside a module and runs its `onLoad` once.
pub trait CodeLoader {
    fn invoke_entry(
        &mut self,
        module: &ModuleContext,
        entry: &str,
        context: &EntryContext,
    ) -> LoaderResult<()>;
}

/// Archive path of the library implementing `entry`:
/// `com.example.Hello` -> `code/com/example/Hello.so` (platform extension).
pub fn entry_library_path(entry: &str) -> LoaderResult<String> {
    let valid = !entry.is_empty()
        && entry.split('.').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        });
    if !valid {
        return Err(LoaderError::EntryNotFound {
            entry: entry.to_string(),
            reason: "not a valid entry identifier".into(),
        });
    }

    Ok(format!(
        "{}{}.{}",
        CODE_PREFIX,
        entry.replace('.', "/"),
        std::env::consts::DLL_EXTENSION
    ))
}

/// Code loader backed by the platform dynamic linker.
///
/// Entry libraries are copied out of the archive into the module's working
/// directory and opened from there. They stay loaded as long as this value
/// lives.
#[derive(Debug, Default)]
pub struct DylibCodeLoader {
    libraries: Vec<(PathBuf, Library)>,
}

impl DylibCodeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&self) -> impl Iterator<Item = &PathBuf> {
        self.libraries.iter().map(|(path, _)| path)
    }
}

impl CodeLoader for DylibCodeLoader {
    fn invoke_entry(
        &mut self,
        module: &ModuleContext,
        entry: &str,
        context: &EntryContext,
    ) -> LoaderResult<()> {
        let entry_path = entry_library_path(entry)?;
        let bytes = PackageArchive::open(module.archive())?
            .read_entry(&entry_path)?
            .ok_or_else(|| LoaderError::EntryNotFound {
                entry: entry.to_string(),
                reason: format!("{} missing from {:?}", entry_path, module.archive()),
            })?;

        let work_dir = module.work_dir();
        std::fs::create_dir_all(work_dir).map_err(|e| LoaderError::io(work_dir, e))?;
        let file_name = entry_path.rsplit('/').next().unwrap_or(&entry_path);
        let library_path = work_dir.join(file_name);
        std::fs::write(&library_path, bytes).map_err(|e| LoaderError::io(&library_path, e))?;

        // SAFETY: loading foreign code runs its initializers with full host
        // privileges; packages are trusted by the user who installed them.
        let library = unsafe { Library::new(&library_path) }.map_err(|source| {
            LoaderError::LibraryLoad {
                path: library_path.clone(),
                source,
            }
        })?;
        // SAFETY: `onLoad` is declared with the `EntryFn` signature by contract.
        let on_load: EntryFn = unsafe {
            let symbol = library
                .get::<EntryFn>(ENTRY_SYMBOL)
                .map_err(|e| LoaderError::EntryNotFound {
                    entry: entry.to_string(),
                    reason: e.to_string(),
                })?;
            *symbol
        };
        self.libraries.push((library_path.clone(), library));

        debug!("Invoking onLoad of {} from {:?}", entry, library_path);
        // SAFETY: the library is kept alive in `self.libraries`.
        unsafe { on_load(context) };
        Ok(())
    }
}
