mod config;
mod db_types;
mod error;
mod handlers;
mod pin;
mod request;
mod store;
mod types;

use crate::config::Config;
use crate::pin::{PinGenerator, ThreadRandom};
use crate::store::{InterviewStore, PgStore};
use crate::types::AppState;

use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;

pub mod consts {
    pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    pub const DEFAULT_PIN_MAX_ATTEMPTS: usize = 1_000;
    pub const PIN_DIGITS: usize = 4;
    pub const PIN_SPACE: usize = 10_000;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_file(true)
                .with_line_number(true),
        )
        .with(tracing_subscriber::filter::Targets::new().with_targets([
            ("hyper", tracing_subscriber::filter::LevelFilter::OFF),
            ("sqlx", tracing_subscriber::filter::LevelFilter::WARN),
            ("interview_pin", config.log_level),
        ]));
    tracing::subscriber::set_global_default(subscriber)?;

    let store = PgStore::connect(&config)
        .await
        .context("failed to connect to postgres")?;
    if config.run_migrations {
        store.migrate().await.context("failed to run migrations")?;
    }
    let store: Arc<dyn InterviewStore> = Arc::new(store);

    let app_state = Arc::new(AppState {
        store: store.clone(),
        pin_generator: PinGenerator::new(Box::new(ThreadRandom), config.pin_max_attempts),
        store_timeout: config.store_timeout,
    });

    let app = handlers::router(app_state);

    info!(addr = %config.bind_addr, "listening");
    axum::Server::try_bind(&config.bind_addr)
        .with_context(|| format!("failed to bind {}", config.bind_addr))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error=%e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error=%e, "failed to listen for sigterm");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
