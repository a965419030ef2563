mod error;
mod handlers;
mod metrics;
mod routes;

use anyhow::Context;
use dispatch_common::config::ServerConfig;
use dispatch_common::service::DispatchService;
use dispatch_common::store::DispatchStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

pub struct AppState {
    pub service: DispatchService,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            service: DispatchService::new(DispatchStore::with_drained_memory(config.drained_memory)),
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Test dispatcher booting...");

    let config = ServerConfig::from_env();
    let state = Arc::new(AppState::new(&config));
    let app = routes::routes().with_state(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, drained_memory = config.drained_memory, "HTTP server listening");
    info!("Ready to accept test lists");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            warn!("Received shutdown signal, pending queues will be dropped");
        })
        .await
        .context("Server error")?;

    info!("Dispatcher shutdown complete");
    Ok(())
}
