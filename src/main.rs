//! Hierarchy Dashboard server
//!
//! Loads the node headcounts once, then serves the dashboard.
//!
//! Usage:
//!   HIERARCHY_DB=/path/to/org.db hierarchy-dashboard
//!
//! Or with args:
//!   hierarchy-dashboard --db /path/to/org.db --bind 0.0.0.0:8080

use clap::Parser;
use hierarchy_dashboard_lib::db::Database;
use hierarchy_dashboard_lib::http_server::{self, AppState};
use hierarchy_dashboard_lib::settings::{ServerArgs, Settings};
use hierarchy_dashboard_lib::{DashboardSnapshot, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = ServerArgs::parse();
    init_logging();

    if let Err(e) = run(args).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn run(args: ServerArgs) -> Result<()> {
    let settings = Settings::for_args(&args)?;
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = settings.resolve(&args, &cwd);

    tracing::info!("Database: {}", config.db_path.display());
    tracing::info!("Binding to: {}", config.bind);

    // Nothing is served unless the initial load succeeds
    let db = Database::open(&config.db_path)?;
    let snapshot = Arc::new(DashboardSnapshot::load(&db)?);
    drop(db);

    let state = AppState::new(snapshot, &config.page_title);
    http_server::serve(&config.bind, state).await
}
