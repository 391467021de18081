pub mod commands;
pub mod core;

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::commands::{Cli, Command};

pub use crate::core::error::{LoaderError, LoaderResult};
pub use crate::core::loader::{CodeLoader, EntryContext, LoadOutcome, LoadReport, ModLoader};
pub use crate::core::package::{Package, PackageManifest};
pub use crate::core::state::{Host, LoaderPaths, LoaderSettings};

pub fn run() -> ExitCode {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ncmodloader_lib=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings();
    tracing::info!("NCModloader starting...");

    match cli.command.unwrap_or(Command::Load) {
        Command::Load => match commands::load(&settings) {
            Ok(reports) => print_json(&reports),
            Err(e) => {
                tracing::error!("Load aborted: {}", e);
                ExitCode::FAILURE
            }
        },
        Command::Sync => match commands::sync(&settings) {
            Ok(entries) => print_json(&entries),
            Err(e) => {
                tracing::error!("Sync aborted: {}", e);
                ExitCode::FAILURE
            }
        },
        Command::List => {
            let queue: Vec<_> = commands::list(&settings)
                .into_iter()
                .map(|package| package.archive)
                .collect();
            print_json(&queue)
        }
        Command::Teardown => print_json(&commands::teardown(&settings)),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Cannot render output: {}", e);
            ExitCode::FAILURE
        }
    }
}
