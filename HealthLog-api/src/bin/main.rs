use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use health_log_api::api::create_application;
use health_log_domain::auth::token_blacklist::start_cleanup_task;
use health_log_domain::database::initialize_database_pool;

const DEFAULT_LOG_FILTER: &str = "health_log_api=debug,health_log_domain=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    init_tracing();

    if !dotenv_loaded {
        warn!("No .env file loaded; reading configuration from the process environment");
    }
    info!("Starting HealthLog API server");

    prepare_storage()?;

    if std::env::var("JWT_SECRET").is_err() {
        warn!("JWT_SECRET is not set; login and protected routes will fail");
    }

    start_cleanup_task();

    let app = create_application().await;

    let port: u16 = match std::env::var("PORT") {
        Ok(raw) => raw.parse().with_context(|| format!("PORT must be a number, got {:?}", raw))?,
        Err(_) => 3000,
    };
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(false)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stdout),
        )
        .with(filter)
        .init();
}

/// Point the pool at `$DATA_DIR/health_log.db` unless `DB_SQLITE_PATH` is
/// already set, then open it. Repositories keep data in memory when this fails.
fn prepare_storage() -> anyhow::Result<()> {
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let data_dir = Path::new(&data_dir);

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    if std::env::var_os("DB_SQLITE_PATH").is_none() {
        let db_path = data_dir.join("health_log.db");
        info!("Using SQLite database {}", db_path.display());
        std::env::set_var("DB_SQLITE_PATH", db_path);
    }

    match initialize_database_pool() {
        Ok(()) => info!("Database pool ready"),
        Err(e) => error!("Database unavailable, measurements will not survive a restart: {}", e),
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Cannot install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = sigterm => {},
    }

    info!("Shutdown signal received, draining connections");
}
