// ─── Native Library Stager ───
// Extracts a package's `lib/` subtree into its private natives directory.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::archive::{ExtractOptions, PackageArchive};
use crate::core::error::{LoaderError, LoaderResult};
use crate::core::package::Package;
use crate::core::state::LoaderPaths;

pub const NATIVE_PREFIX: &str = "lib/";

/// Stage native libraries for `package` and return the directory to inject.
///
/// Failing to create the directory is fatal for the package. An archive with
/// no `lib/` entries still yields the (empty) directory.
pub fn stage_natives(
    archive: &mut PackageArchive,
    package: &Package,
    paths: &LoaderPaths,
) -> LoaderResult<PathBuf> {
    let natives_dir = paths.natives_dir(package.base_name());
    std::fs::create_dir_all(&natives_dir).map_err(|source| LoaderError::NativeStagingFailed {
        path: natives_dir.clone(),
        source,
    })?;

    let options = ExtractOptions {
        strip_prefix: true,
        ..ExtractOptions::default()
    };
    let extraction = archive.extract_subtree(NATIVE_PREFIX, &natives_dir, &options)?;

    if extraction.found {
        info!(
            "Staged {} native libraries for {} in {:?}",
            extraction.files.len(),
            package.name,
            natives_dir
        );
    } else {
        debug!("No lib/ entries in {}, native dir left empty", package.name);
    }

    Ok(natives_dir)
}
