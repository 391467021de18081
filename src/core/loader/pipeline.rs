// ─── Dynamic Loader ───
// Runs one package through manifest validation, the capability pipeline and
// its entry point. `load` is a hard boundary: nothing a package does, errors
// or panics, escapes it.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use super::context::ModuleContext;
use super::entry::{CodeLoader, EntryContext};
use crate::core::archive::PackageArchive;
use crate::core::assets::build_overlay;
use crate::core::error::{EntryPanic, LoaderError, LoaderResult};
use crate::core::natives::stage_natives;
use crate::core::package::Package;
use crate::core::packs::register_pack;
use crate::core::state::{Host, LoaderPaths};

/// How a single package load ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    Loaded {
        entry: String,
        native_dir: Option<PathBuf>,
        asset_overlay: Option<PathBuf>,
        resource_pack: Option<PathBuf>,
    },
    /// Manifest missing or invalid; nothing was touched.
    Skipped { reason: String },
    Failed { cause: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub package: String,
    #[serde(flatten)]
    pub outcome: LoadOutcome,
    pub finished_at: DateTime<Utc>,
}

impl LoadReport {
    pub fn is_loaded(&self) -> bool {
        matches!(self.outcome, LoadOutcome::Loaded { .. })
    }
}

/// Loads packages one at a time into the host.
pub struct ModLoader<H: Host, C: CodeLoader> {
    paths: LoaderPaths,
    host: H,
    code_loader: C,
    /// Boxed so the address handed to entry points stays stable.
    modules: Vec<Box<ModuleContext>>,
}

impl<H: Host, C: CodeLoader> ModLoader<H, C> {
    pub fn new(paths: LoaderPaths, host: H, code_loader: C) -> Self {
        Self {
            paths,
            host,
            code_loader,
            modules: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn code_loader(&self) -> &C {
        &self.code_loader
    }

    /// Contexts of every package whose entry point was reached.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleContext> {
        self.modules.iter().map(Box::as_ref)
    }

    /// Load every package in order; one failure never stops the rest.
    pub fn load_all(&mut self, packages: &[Package]) -> Vec<LoadReport> {
        packages
            .iter()
            .map(|package| {
                info!("Loading -> {}", package.name);
                let report = self.load(package);
                if report.is_loaded() {
                    info!("Loaded -> {} Done!", package.name);
                }
                report
            })
            .collect()
    }

    /// Load one package. Never panics and never returns an error: the result
    /// is reported through the log and the returned report.
    pub fn load(&mut self, package: &Package) -> LoadReport {
        let result = catch_unwind(AssertUnwindSafe(|| self.try_load(package)));

        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err @ (LoaderError::ManifestMissing(_) | LoaderError::ManifestInvalid { .. }))) => {
                error!("{}, skipped: {}", err, package.name);
                LoadOutcome::Skipped {
                    reason: err.to_string(),
                }
            }
            Ok(Err(err)) => {
                let cause = err.reported_cause();
                error!("Failed to load {}: {}", package.name, cause);
                LoadOutcome::Failed { cause }
            }
            Err(payload) => {
                let cause = format!("pipeline panicked: {}", panic_message(payload.as_ref()));
                error!("Failed to load {}: {}", package.name, cause);
                LoadOutcome::Failed { cause }
            }
        };

        LoadReport {
            package: package.name.clone(),
            outcome,
            finished_at: Utc::now(),
        }
    }

    fn try_load(&mut self, package: &Package) -> LoaderResult<LoadOutcome> {
        let mut archive = PackageArchive::open(&package.archive).map_err(|e| {
            LoaderError::ManifestInvalid {
                package: package.name.clone(),
                reason: format!("failed to read manifest: {}", e),
            }
        })?;
        let manifest = archive
            .read_manifest()?
            .ok_or_else(|| LoaderError::ManifestMissing(package.name.clone()))?;
        let entry = manifest.entry(&package.name)?.to_string();

        // Natives go last: their directory is only needed once code loads.
        let asset_overlay = if manifest.assets_override {
            build_overlay(&mut archive, package, &self.paths, &mut self.host)?
        } else {
            None
        };
        let resource_pack = if manifest.custom_pack {
            register_pack(&mut archive, package, &self.paths)?.map(|pack| pack.dir)
        } else {
            None
        };
        let native_dir = if manifest.native {
            Some(stage_natives(&mut archive, package, &self.paths)?)
        } else {
            None
        };
        drop(archive);

        let mut module = Box::new(ModuleContext::new(
            package.clone(),
            self.paths.code_dir(package.base_name()),
            self.host.system_library_dirs(),
        ));
        if let Some(dir) = &native_dir {
            module.inject_native_dir(dir);
        }

        let context = EntryContext::new(self.host.raw_handle(), &module);
        let code_loader = &mut self.code_loader;
        let invoked = catch_unwind(AssertUnwindSafe(|| {
            code_loader.invoke_entry(&module, &entry, &context)
        }));
        self.modules.push(module);

        match invoked {
            Ok(result) => result?,
            Err(payload) => {
                return Err(LoaderError::Invocation {
                    entry,
                    source: Box::new(EntryPanic(panic_message(payload.as_ref()))),
                })
            }
        }

        info!("Loaded: {}", entry);
        Ok(LoadOutcome::Loaded {
            entry,
            native_dir,
            asset_overlay,
            resource_pack,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
