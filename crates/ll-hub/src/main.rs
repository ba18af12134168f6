use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ll_store::CancellationToken;

mod api;
mod config;
mod registry;

// =============================================================================
// CLI
// =============================================================================

#[derive(Parser)]
#[command(
    name = "ll-hub",
    version = "0.1.0",
    about = "LogLens Search Hub"
)]
struct Args {
    /// Path to config file
    #[arg(long, default_value = "loglens.toml")]
    config: PathBuf,

    /// Server bind address (overrides `[server] bind`)
    #[arg(long)]
    bind: Option<String>,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "ll_hub=info,ll_store=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match config::Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config {:?}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    let registry = match config::build_registry(&config.providers).await {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!("Failed to configure providers: {}", e);
            std::process::exit(1);
        }
    };

    if registry.is_empty() {
        tracing::error!("No providers configured in {:?}. Exiting.", args.config);
        std::process::exit(1);
    }

    let shutdown = CancellationToken::new();
    let provider_count = registry.len();
    let state = Arc::new(api::AppState {
        registry,
        max_page_size: config.server.max_page_size,
        shutdown: shutdown.clone(),
    });
    let app = api::router(state);

    let bind = args.bind.unwrap_or(config.server.bind);
    let addr: SocketAddr = match bind.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid bind address {}: {}", bind, e);
            std::process::exit(1);
        }
    };
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    tracing::info!("  LogLens v0.1.0");
    tracing::info!("  Search:     http://{}/api/logs", addr);
    tracing::info!("  Keys:       http://{}/api/keys", addr);
    tracing::info!("  Providers:  {}", provider_count);
    tracing::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
    {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Resolve on Ctrl-C, cancelling every search still in flight.
async fn shutdown_signal(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
    token.cancel();
}
