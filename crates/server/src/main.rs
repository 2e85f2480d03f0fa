mod customers;
mod health;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rolodex_core::config::{AppConfig, LoadOptions, StoreBackend};
use rolodex_db::repositories::{
    CustomerRepository, InMemoryCustomerRepository, SqlCustomerRepository,
};

fn init_logging(config: &AppConfig) {
    use rolodex_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let repository: Arc<dyn CustomerRepository> = match config.store.backend {
        StoreBackend::Sqlite => {
            let pool = rolodex_db::connect(&config.database).await?;
            rolodex_db::migrations::run_pending(&pool).await?;
            Arc::new(SqlCustomerRepository::new(pool))
        }
        StoreBackend::Memory => Arc::new(InMemoryCustomerRepository::default()),
    };

    let app = customers::router(repository.clone()).merge(health::router(repository));

    let address = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        store_backend = ?config.store.backend,
        "rolodex server started"
    );

    let (close_tx, close_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = close_rx.await;
            })
            .await
    });

    wait_for_shutdown().await;
    tracing::info!(event_name = "system.server.stopping", "rolodex server stopping");

    let _ = close_tx.send(());
    let drain = Duration::from_secs(config.server.graceful_shutdown_secs);
    match tokio::time::timeout(drain, server).await {
        Ok(result) => result??,
        Err(_) => {
            tracing::warn!(
                event_name = "system.server.drain_timeout",
                drain_secs = config.server.graceful_shutdown_secs,
                "graceful shutdown window elapsed with requests still in flight"
            );
        }
    }

    tracing::info!(event_name = "system.server.stopped", "rolodex server stopped");
    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "failed to listen for the shutdown signal");
    }
}
