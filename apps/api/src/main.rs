//! # Songbook API
//!
//! REST server for the song catalog.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  .env (optional) ──► ApiConfig ──► Dispatch ──► PostgreSQL ──► migrate  │
//! │                                                                   │     │
//! │                                                                   ▼     │
//! │  SIGINT/SIGTERM ──► drain (10s) ──► close pool ◄── serve HTTP_PORT      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use songbook_api::config::ApiConfig;
use songbook_api::server::{self, ShutdownOutcome, SHUTDOWN_GRACE};
use songbook_api::service::{SongService, SongServiceImpl};
use songbook_api::{build_router, logging, AppState};
use songbook_db::{migrations, Database, SongStore};

/// Upper bound on waiting for pooled connections to be returned.
const POOL_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on waiting for blocking work once `run` has returned.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    let config = ApiConfig::load().context("Failed to load configuration")?;
    let dispatch = logging::dispatch(config.logger.level, Path::new(logging::LOG_DIR))
        .context("Failed to set up logging")?;

    // The dispatch is entered per worker thread instead of installed globally.
    let worker_dispatch = dispatch.clone();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .on_thread_start(move || logging::enter_thread(&worker_dispatch))
        .on_thread_stop(logging::leave_thread)
        .build()
        .context("Failed to build the async runtime")?;

    let result = tracing::dispatcher::with_default(&dispatch, || {
        if let Err(e) = dotenv {
            warn!(error = %e, "Could not load .env file, using process environment");
        }
        runtime.block_on(run(config))
    });

    // Drops any connection task a forced shutdown left behind.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

async fn run(config: ApiConfig) -> anyhow::Result<()> {
    info!(
        port = config.http.port,
        timeout_secs = config.http.timeout.as_secs(),
        database = ?config.database,
        "Starting the service"
    );

    let db = Database::new(config.db_config())
        .await
        .context("Failed to connect to the database")?;

    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    match migrations::migration_status(db.pool()).await {
        Ok((available, applied)) => info!(available, applied, "Migration status"),
        Err(e) => warn!(error = %e, "Could not read migration status"),
    }

    let store: Arc<dyn SongStore> = Arc::new(db.songs());
    let service: Arc<dyn SongService> = Arc::new(SongServiceImpl::new(store));
    let app = build_router(AppState::new(service), config.http.timeout);

    let addr = config.http_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "HTTP server is listening");

    let outcome = server::run(listener, app, server::shutdown_signal(), SHUTDOWN_GRACE).await;

    if tokio::time::timeout(POOL_CLOSE_TIMEOUT, db.close()).await.is_err() {
        warn!(
            timeout_secs = POOL_CLOSE_TIMEOUT.as_secs(),
            "Database pool did not close in time"
        );
    }

    match outcome.context("HTTP server failed")? {
        ShutdownOutcome::Graceful => info!("Service stopped"),
        ShutdownOutcome::Forced => warn!("Service stopped with requests still in flight"),
    }
    Ok(())
}
