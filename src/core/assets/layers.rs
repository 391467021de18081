use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::core::error::{LoaderError, LoaderResult};

/// Asset lookup over a stack of overlay archives.
///
/// Layers are kept in registration order; lookups walk them newest first so
/// the last registration wins on a conflicting name.
#[derive(Debug, Default)]
pub struct LayeredAssets {
    layers: Vec<PathBuf>,
}

impl LayeredAssets {
    /// Register `archive` above every existing layer.
    pub fn add_layer(&mut self, archive: &Path) -> LoaderResult<()> {
        let file = File::open(archive).map_err(|e| LoaderError::io(archive, e))?;
        ZipArchive::new(file)?;

        self.layers.retain(|existing| existing != archive);
        self.layers.push(archive.to_path_buf());
        debug!("Asset layer added: {:?} ({} layers)", archive, self.layers.len());
        Ok(())
    }

    pub fn layers(&self) -> &[PathBuf] {
        &self.layers
    }

    /// Read asset `name` (relative to `assets/`) from the highest layer that has it.
    pub fn open(&self, name: &str) -> LoaderResult<Option<Vec<u8>>> {
        let entry_name = format!("assets/{}", name.trim_start_matches('/'));

        for layer in self.layers.iter().rev() {
            let file = File::open(layer).map_err(|e| LoaderError::io(layer, e))?;
            let mut archive = ZipArchive::new(file)?;
            let mut entry = match archive.by_name(&entry_name) {
                Ok(entry) => entry,
                Err(ZipError::FileNotFound) => continue,
                Err(e) => return Err(e.into()),
            };
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| LoaderError::io(layer, e))?;
            return Ok(Some(bytes));
        }

        Ok(None)
    }
}
