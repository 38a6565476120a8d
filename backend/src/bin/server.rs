//! Scheduling HTTP Server Binary
//!
//! Entry point for the inspection scheduling REST API. It loads the
//! configuration, seeds the in-memory repository, sets up the HTTP router and
//! starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! # Defaults, or ./scheduler.toml when present
//! cargo run --bin scheduler-server
//!
//! # Explicit configuration file
//! cargo run --bin scheduler-server -- --config backend/scheduler.toml
//! ```
//!
//! # Environment Variables
//!
//! - `SCHEDULER_CONFIG`: Path of the TOML configuration file
//! - `HOST`: Server host (overrides `[server] host`)
//! - `PORT`: Server port (overrides `[server] port`)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use inspection_scheduler::config::SchedulerConfig;
use inspection_scheduler::db::{FullRepository, LocalRepository, SeedData};
use inspection_scheduler::http::{create_router, AppState};
use inspection_scheduler::scheduling::SchedulingEngine;
use inspection_scheduler::services::{LogNotificationSink, NotificationSink};

/// Value of `--config <path>` (or `--config=<path>`), if given.
fn config_path_from_args() -> anyhow::Result<Option<PathBuf>> {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if let Some(path) = arg.strip_prefix("--config=") {
            return Ok(Some(PathBuf::from(path)));
        }
        if arg == "--config" {
            let path = args.next().context("--config requires a path")?;
            return Ok(Some(PathBuf::from(path)));
        }
    }
    Ok(None)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting scheduling HTTP server");

    let config_path = config_path_from_args()?;
    let config = SchedulerConfig::load(config_path.as_deref())?;

    let repository = LocalRepository::new();
    if let Some(seed_file) = &config.repository.seed_file {
        let seed = SeedData::from_json_file(seed_file)?;
        info!(
            "Seeding repository from {} ({} technicians, {} leads)",
            seed_file.display(),
            seed.technicians.len(),
            seed.leads.len()
        );
        repository.seed(seed);
    }
    let repository: Arc<dyn FullRepository> = Arc::new(repository);
    info!("Repository initialized successfully");

    let engine = Arc::new(SchedulingEngine::from_config(&config));
    info!(
        "Scheduling engine ready: {} suburbs, business hours {}-{}",
        engine.suburbs().len(),
        engine.business_hours().open.format("%H:%M"),
        engine.business_hours().close.format("%H:%M")
    );

    let notifier: Arc<dyn NotificationSink> = Arc::new(LogNotificationSink);
    let state = AppState::new(repository, engine, notifier);

    // Create router with all endpoints
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
