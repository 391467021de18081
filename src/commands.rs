use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::core::config::{ConfigReconciler, PackageConfigEntry};
use crate::core::error::LoaderResult;
use crate::core::lifecycle::{CleanupSummary, LifecycleManager};
use crate::core::loader::{DylibCodeLoader, LoadReport, ModLoader};
use crate::core::package::Package;
use crate::core::state::{default_settings_path, LoaderPaths, LoaderSettings, StandaloneHost};

#[derive(Debug, Parser)]
#[command(name = "ncmodloader", version, about = "Load mod packages into the host")]
pub struct Cli {
    /// Settings file (defaults to the loader data directory).
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,
    /// External directory holding `.ncm` packages.
    #[arg(long, global = true)]
    pub packages_dir: Option<PathBuf>,
    /// Internal cache root.
    #[arg(long, global = true)]
    pub internal_dir: Option<PathBuf>,
    /// Host data root (resource packs and the global pack registry).
    #[arg(long, global = true)]
    pub host_data_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum Command {
    /// Purge, reconcile and load every enabled package.
    Load,
    /// Reconcile the package directory with the persisted config.
    Sync,
    /// Show the packages a load would run, in order.
    List,
    /// Remove this loader's resource packs and registry entries.
    Teardown,
}

impl Cli {
    /// Settings from disk with command-line overrides applied.
    pub fn settings(&self) -> LoaderSettings {
        let path = self.settings.clone().unwrap_or_else(default_settings_path);
        let mut settings = LoaderSettings::load(&path);
        if let Some(dir) = &self.packages_dir {
            settings.packages_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.internal_dir {
            settings.internal_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.host_data_dir {
            settings.host_data_dir = Some(dir.clone());
        }
        settings
    }
}

/// Full startup sequence: purge, reconcile, load in order.
///
/// Only failing to establish the package directories aborts; every package
/// problem ends up in its report.
pub fn load(settings: &LoaderSettings) -> LoaderResult<Vec<LoadReport>> {
    let paths = LoaderPaths::from_settings(settings);

    LifecycleManager::new(paths.clone()).startup();
    let reconciler = ConfigReconciler::new(paths.clone());
    reconciler.reconcile()?;
    let queue = reconciler.load_ordered();

    let host = StandaloneHost::new(settings.system_library_dirs.clone());
    let mut loader = ModLoader::new(paths, host, DylibCodeLoader::new());
    let reports = loader.load_all(&queue);

    let loaded = reports.iter().filter(|r| r.is_loaded()).count();
    if loaded < reports.len() {
        warn!("{} of {} packages failed to load", reports.len() - loaded, reports.len());
    }
    info!("Loaded {} packages", loaded);

    // Entry points may keep using their libraries after `onLoad` returns.
    std::mem::forget(loader);
    Ok(reports)
}

pub fn sync(settings: &LoaderSettings) -> LoaderResult<Vec<PackageConfigEntry>> {
    ConfigReconciler::new(LoaderPaths::from_settings(settings)).reconcile()
}

pub fn list(settings: &LoaderSettings) -> Vec<Package> {
    ConfigReconciler::new(LoaderPaths::from_settings(settings)).load_ordered()
}

pub fn teardown(settings: &LoaderSettings) -> CleanupSummary {
    LifecycleManager::new(LoaderPaths::from_settings(settings)).teardown()
}
