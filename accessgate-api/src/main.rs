//! # accessgate API Server
//!
//! Receives payment webhooks, provisions an account for every paid invoice,
//! and emails the buyer their generated credentials.
//!
//! ## Startup
//!
//! 1. Install the tracing subscriber
//! 2. Load configuration (`.env` and environment)
//! 3. Open the user store (PostgreSQL with migrations, or in-memory)
//! 4. Build the notifier (SMTP, or disabled when mail settings are missing
//!    or rejected)
//! 5. Serve until Ctrl-C / SIGTERM
//!
//! ## Shutdown
//!
//! The listener stops accepting connections, in-flight provisioning runs get
//! `SHUTDOWN_GRACE_SECS` to finish, then the store is closed.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p accessgate-api
//! ```

use accessgate_api::{
    app::{build_notifier, build_router, AppState},
    config::{Config, StoreConfig},
};
use accessgate_shared::{
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
    },
    provisioning::{Dispatcher, ProvisioningWorkflow},
    store::{MemoryUserStore, PgUserStore, UserStore},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env may carry RUST_LOG and LOG_FORMAT, so load it before the subscriber
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?;

    tracing::info!(
        "accessgate API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let store = open_store(&config.store).await?;
    let notifier = build_notifier(&config.mail);

    let workflow = ProvisioningWorkflow::new(
        store.clone(),
        notifier,
        config.webhook.provisioning.clone(),
    );
    let dispatcher = Dispatcher::new(workflow);

    let bind_address = config.bind_address();
    let shutdown_grace = config.api.shutdown_grace;
    let state = AppState::new(store.clone(), dispatcher.clone(), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if !dispatcher.shutdown(shutdown_grace).await {
        tracing::warn!("Exiting with provisioning runs still in flight");
    }
    store.close().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Installs the global subscriber; `LOG_FORMAT=json` switches to JSON lines
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "accessgate_api=debug,accessgate_shared=debug,tower_http=debug".into()
            }),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

async fn open_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn UserStore>> {
    match config {
        StoreConfig::Postgres {
            url,
            max_connections,
        } => {
            let pool = create_pool(DatabaseConfig {
                url: url.clone(),
                max_connections: *max_connections,
                ..Default::default()
            })
            .await?;

            run_migrations(&pool).await?;

            Ok(Arc::new(PgUserStore::new(pool)))
        }
        StoreConfig::Memory => {
            tracing::warn!("Using in-memory user store; accounts are lost on restart");
            Ok(Arc::new(MemoryUserStore::new()))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
