//! festsync - festival listing sync tool
//!
//! Resolves the root folder, opens the listing database, runs one command
//! through the serialized sync worker, then shuts the worker down.

use anyhow::{Context, Result};
use clap::Parser;
use fest_common::config::{RootFolderInitializer, RootFolderResolver};
use fest_common::logging::init_tracing;
use fest_sync::cli::{self, Cli};
use fest_sync::{ImportCoordinator, SqliteStore, SyncWorker};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Step 1: Config file and logging
    let resolver = RootFolderResolver::new("festsync")
        .with_cli_arg(args.root_folder.clone())
        .with_config_path(args.config.clone());
    let config = resolver.load_config();
    init_tracing(&config.logging.level)?;

    info!("Starting festsync {}", env!("CARGO_PKG_VERSION"));

    // Step 2: Resolve and create root folder
    let initializer = RootFolderInitializer::new(resolver.resolve_with(&config))
        .with_database_file(config.database_file());
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    // Step 3: Open or create database
    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let store = SqliteStore::open(&db_path)
        .await
        .context("Failed to open listing database")?;

    // Step 4: Run the command through the worker
    let worker = SyncWorker::spawn(ImportCoordinator::new(store));
    let outcome = cli::execute(args.command, &worker.handle()).await;
    worker.shutdown().await?;

    println!("{}", outcome?);
    Ok(())
}
