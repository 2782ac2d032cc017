//! subscriber-api server.
//!
//! Accepts purchase batches on `POST /purchases` and reconciles them into the
//! `customers`, `products` and `subscribers` tables.

mod config;
mod health;
mod logging;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use subscriber_api_purchases::{purchases_router, PurchasesState};
use subscriber_db::{PgPurchaseStore, PurchaseStore};
use tokio::signal;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::Config;

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log, config.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host,
        port = config.port,
        max_connections = config.database_max_connections,
        "Starting subscriber API"
    );

    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.database_acquire_timeout)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            info!("Database connection established");
            pool
        }
        Err(e) => {
            eprintln!("Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    let store: Arc<dyn PurchaseStore> = Arc::new(PgPurchaseStore::new(pool.clone()));
    let app = build_app(store, &config);

    let addr: SocketAddr = match config.bind_addr().parse() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("Invalid bind address {}: {e}", config.bind_addr());
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    info!(%addr, "Listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }

    pool.close().await;
    info!("Server shutdown complete");
}

/// Assemble the service router.
fn build_app(store: Arc<dyn PurchaseStore>, config: &Config) -> Router {
    let purchases = PurchasesState::new(Arc::clone(&store)).with_max_body_size(config.max_body_size);

    Router::new()
        .merge(health::health_routes(store))
        .merge(purchases_router(purchases))
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(TraceLayer::new_for_http())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
