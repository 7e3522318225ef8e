//! Bazaar listing server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bazaar_core::SystemClock;
use bazaar_server::network::{AppState, NetworkConfig, NetworkModule};
use bazaar_server::service::ServerConfig;
use bazaar_server::storage::{load_seed_file, HashMapDocumentStore};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bazaar-server", about = "Marketplace listing server")]
struct Cli {
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0", env = "BAZAAR_HOST")]
    host: String,
    /// Listen port; 0 picks a free one.
    #[arg(long, default_value_t = 8080, env = "BAZAAR_PORT")]
    port: u16,
    /// Allowed CORS origins, comma separated.
    #[arg(long, default_value = "*", value_delimiter = ',', env = "BAZAAR_CORS_ORIGINS")]
    cors_origins: Vec<String>,
    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30, env = "BAZAAR_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: u64,
    /// Shutdown drain timeout in seconds.
    #[arg(long, default_value_t = 30, env = "BAZAAR_DRAIN_TIMEOUT_SECS")]
    drain_timeout_secs: u64,
    /// Reject submissions for categories without a schema document.
    #[arg(long, env = "BAZAAR_SCHEMA_REQUIRED")]
    schema_required: bool,
    /// Attach failure diagnostics to internal error responses.
    #[arg(long, env = "BAZAAR_DEBUG_DIAGNOSTICS")]
    debug_diagnostics: bool,
    /// JSON seed file loaded into the store at startup.
    #[arg(long, env = "BAZAAR_SEED")]
    seed: Option<PathBuf>,
    /// Emit logs as JSON lines.
    #[arg(long, env = "BAZAAR_JSON_LOGS")]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let store = Arc::new(HashMapDocumentStore::new());
    if let Some(path) = &cli.seed {
        let count = load_seed_file(store.as_ref(), path)
            .await
            .context("loading seed data")?;
        info!(documents = count, path = %path.display(), "Seed loaded");
    }

    let config = ServerConfig {
        schema_required: cli.schema_required,
        debug_diagnostics: cli.debug_diagnostics,
        ..ServerConfig::default()
    };
    let state = AppState::new(store, config, Arc::new(SystemClock));

    let network = NetworkConfig {
        host: cli.host,
        port: cli.port,
        cors_origins: cli.cors_origins,
        request_timeout: Duration::from_secs(cli.request_timeout_secs),
        drain_timeout: Duration::from_secs(cli.drain_timeout_secs),
    };
    let mut module = NetworkModule::new(network, state);
    let port = module.start().await?;
    info!(port, "Bazaar server listening");

    module
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await
}
