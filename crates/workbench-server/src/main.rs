//! CRE workbench daemon.
//!
//! Local backend for the workflow workbench frontend: writes generated
//! workflow sources into the orchestrator checkout, runs `cre workflow
//! simulate` on demand, and keeps the signing key in the orchestrator's
//! `.env`.
//!
//! # Configuration
//!
//! Values are resolved with priority: CLI arguments, then environment
//! variables, then defaults.
//!
//! - `PORT`: HTTP listen port (default 3001)
//! - `FRONTEND_ORIGIN`: allowed CORS origin (default http://localhost:3000)
//! - `ORCHESTRATOR_ROOT`: orchestrator checkout directory (default
//!   `../cre-orchestrator` next to the executable)
//! - `RUN_MODE`: `development` or `production` (default development)
//! - `ALLOW_FILE_WRITES`: force the write-file endpoint on or off
//!   (default: on in development, off in production)
//! - `CRE_CLI`: simulation CLI program (default `cre`)
//! - `CRE_ETH_PRIVATE_KEY`, `CRE_TARGET`: seed values for a freshly
//!   created `.env`
//! - `RUST_LOG`: log filter (default `info`)

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};

use workbench_core::config::{Overrides, RunMode, WorkbenchConfig};
use workbench_core::env_store;

#[derive(Parser, Debug)]
#[command(name = "workbenchd")]
#[command(about = "Local backend for the CRE workflow workbench")]
struct Args {
    /// HTTP listen port (also: PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Orchestrator checkout directory (also: ORCHESTRATOR_ROOT)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Run mode: development or production (also: RUN_MODE)
    #[arg(short, long)]
    mode: Option<String>,

    /// Allowed CORS origin for the frontend (also: FRONTEND_ORIGIN)
    #[arg(long)]
    frontend_origin: Option<String>,

    /// Enable the write-file endpoint regardless of run mode
    /// (also: ALLOW_FILE_WRITES)
    #[arg(long)]
    allow_file_writes: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let overrides = Overrides {
        port: args.port,
        orchestrator_root: args.root,
        mode: args.mode.as_deref().map(RunMode::parse),
        frontend_origin: args.frontend_origin,
        allow_file_writes: args.allow_file_writes.then_some(true),
    };
    let config = WorkbenchConfig::from_env(overrides);

    info!(
        mode = config.mode.as_str(),
        root = %config.orchestrator_root.display(),
        file_writes = config.allow_file_writes,
        "starting cre-workbench backend"
    );
    if !config.orchestrator_root.is_dir() {
        warn!(
            root = %config.orchestrator_root.display(),
            "orchestrator root does not exist yet; simulations will fail until it does"
        );
    }

    match env_store::ensure_env_file(
        &config.env_file,
        config.bootstrap_key.as_deref(),
        config.bootstrap_target.as_deref(),
    ) {
        Ok(true) => info!(path = %config.env_file.display(), "created .env"),
        Ok(false) => {}
        Err(e) => warn!(path = %config.env_file.display(), "could not initialize .env: {}", e),
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, workbench_server::app(config)).await {
        error!("server error: {}", e);
        std::process::exit(1);
    }
}
