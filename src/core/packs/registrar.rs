// ─── Resource Pack Registrar ───
// Turns a package's `custom_pack/` subtree into a host resource pack and
// records it in the global registry.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::registry::{PackRegistration, PackRegistry};
use crate::core::archive::{ExtractOptions, PackageArchive};
use crate::core::error::{LoaderError, LoaderResult};
use crate::core::package::{Package, MANIFEST_ENTRY};
use crate::core::state::LoaderPaths;

pub const CUSTOM_PACK_PREFIX: &str = "custom_pack/";

const PACK_FORMAT_VERSION: u32 = 2;
const PACK_VERSION: [u32; 3] = [1, 0, 0];
const MIN_ENGINE_VERSION: [u32; 3] = [1, 21, 120];

/// `manifest.json` written into every synthesized resource pack.
#[derive(Debug, Clone, Serialize)]
pub struct ResourcePackManifest {
    pub format_version: u32,
    pub header: PackHeader,
    pub modules: Vec<PackModule>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackHeader {
    pub description: String,
    pub name: String,
    pub uuid: String,
    pub version: [u32; 3],
    pub min_engine_version: [u32; 3],
}

#[derive(Debug, Clone, Serialize)]
pub struct PackModule {
    #[serde(rename = "type")]
    pub module_type: String,
    pub uuid: String,
    pub version: [u32; 3],
}

impl ResourcePackManifest {
    /// Fresh manifest with newly generated pack and module ids.
    pub fn generate(clean_name: &str) -> Self {
        Self {
            format_version: PACK_FORMAT_VERSION,
            header: PackHeader {
                description: format!("This is the Resource Pack of the mod {}", clean_name),
                name: format!("ModPlusPack: {}", clean_name),
                uuid: Uuid::new_v4().to_string(),
                version: PACK_VERSION,
                min_engine_version: MIN_ENGINE_VERSION,
            },
            modules: vec![PackModule {
                module_type: "resources".into(),
                uuid: Uuid::new_v4().to_string(),
                version: PACK_VERSION,
            }],
        }
    }
}

/// A resource pack that was extracted and registered.
#[derive(Debug, Clone)]
pub struct RegisteredPack {
    pub dir: PathBuf,
    pub registration: PackRegistration,
}

/// Extract, describe and register the resource pack of `package`.
///
/// Returns `None`, with the registry untouched, when the archive has no
/// `custom_pack/` entries.
pub fn register_pack(
    archive: &mut PackageArchive,
    package: &Package,
    paths: &LoaderPaths,
) -> LoaderResult<Option<RegisteredPack>> {
    let clean_name = package.clean_name();
    let pack_dir = paths.resource_pack_dir(clean_name);

    let options = ExtractOptions {
        strip_prefix: true,
        keep_dirs: true,
        exclude: vec![MANIFEST_ENTRY.to_string()],
    };
    let extraction = archive.extract_subtree(CUSTOM_PACK_PREFIX, &pack_dir, &options)?;
    if !extraction.found {
        info!("No custom_pack found in: {}", package.name);
        return Ok(None);
    }

    std::fs::create_dir_all(&pack_dir).map_err(|e| LoaderError::io(&pack_dir, e))?;
    let manifest = ResourcePackManifest::generate(clean_name);
    let manifest_path = pack_dir.join(MANIFEST_ENTRY);
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .map_err(|e| LoaderError::io(&manifest_path, e))?;

    let registration = PackRegistration::new(manifest.header.uuid.clone(), clean_name);
    PackRegistry::new(paths.registry_file()).register(&registration)?;

    info!("Global resource pack registered: {}", registration.pack_id);
    info!("Custom pack path: {:?}", pack_dir);
    Ok(Some(RegisteredPack {
        dir: pack_dir,
        registration,
    }))
}
