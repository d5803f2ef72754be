// This is the entry point of the link board CLI.
//
// **Architecture Overview:**
// - `core/` = Business logic (storage-agnostic)
// - `infra/` = Implementations of core traits (SQLite, in-memory)
// - `cli/` = Command-line adapter (argument parsing, output)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run the requested command

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "cli/cli_layer.rs"]
mod cli;
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::cli::{AppContext, Cli};
use crate::config::BoardConfig;
use crate::infra::links::SqliteDocumentStore;
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = BoardConfig::from_env()?;

    let store = SqliteDocumentStore::new(&config.database_path)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database_path))?;
    tracing::debug!(path = %config.database_path, admins = config.admins.len(), "Store ready");

    let ctx = AppContext::new(Arc::new(store), &config);
    let mut stdout = std::io::stdout();
    cli::run(&ctx, cli.command, &mut stdout).await
}
