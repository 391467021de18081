// ─── Asset Overlay Builder ───
// Repackages a package's `assets/` subtree into an overlay archive and hands
// it to the host's asset layer.

use std::path::PathBuf;

use tracing::info;

use crate::core::archive::{zip_directory, ExtractOptions, PackageArchive};
use crate::core::error::{LoaderError, LoaderResult};
use crate::core::package::Package;
use crate::core::state::{Host, LoaderPaths};

pub const ASSETS_PREFIX: &str = "assets/";

/// Build and register the overlay for `package`.
///
/// Returns the overlay path, or `None` when the package declared
/// `assets_override` but ships no `assets/` entries.
pub fn build_overlay<H: Host + ?Sized>(
    archive: &mut PackageArchive,
    package: &Package,
    paths: &LoaderPaths,
    host: &mut H,
) -> LoaderResult<Option<PathBuf>> {
    let assets_root = paths.assets_dir();
    std::fs::create_dir_all(&assets_root).map_err(|e| LoaderError::io(&assets_root, e))?;

    let work = tempfile::Builder::new()
        .prefix(&format!("{}_temp", package.base_name()))
        .tempdir_in(&assets_root)
        .map_err(|e| LoaderError::io(&assets_root, e))?;

    let options = ExtractOptions {
        strip_prefix: false,
        keep_dirs: true,
        ..ExtractOptions::default()
    };
    let extraction = archive.extract_into(ASSETS_PREFIX, work.path(), &options)?;

    if !extraction.found {
        info!(
            "there are no assets in: {} but 'assets_override': true in the manifest",
            package.name
        );
        return Ok(None);
    }

    let overlay = assets_root.join(format!("{}.zip", package.base_name()));
    zip_directory(work.path(), &overlay)?;
    work.close().map_err(|e| LoaderError::io(&assets_root, e))?;

    host.add_asset_overlay(&overlay)?;
    info!(
        "Asset overlay registered for {}: {} files in {:?}",
        package.name,
        extraction.files.len(),
        overlay
    );
    Ok(Some(overlay))
}
