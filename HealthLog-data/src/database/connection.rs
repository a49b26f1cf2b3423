//! SQLite connection pool for HealthLog
//!
//! One pool is built at startup and kept in a global `OnceCell`. Repositories
//! fall back to in-memory storage when it was never initialized.

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use thiserror::Error;
use tracing::{error, info, warn};

use super::migrations::run_sqlite_migrations;

static DB_POOL: OnceCell<DatabasePool> = OnceCell::new();

const DEFAULT_SQLITE_PATH: &str = "data/healthlog.db";

/// Applied to every new connection so concurrent writers wait on a locked
/// database instead of failing immediately
const CONNECTION_PRAGMAS: &str = "PRAGMA busy_timeout = 5000;";

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    Sqlite,
}

impl FromStr for DatabaseType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::Sqlite),
            other => Err(DatabaseError::UnsupportedDatabaseType(other.to_string())),
        }
    }
}

/// Database connection pool
#[derive(Debug, Clone)]
pub enum DatabasePool {
    SQLite(Arc<r2d2::Pool<SqliteConnectionManager>>),
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("SQLite connection pool error: {0}")]
    SqlitePoolError(#[from] r2d2::Error),

    #[error("Database pool is already initialized")]
    PoolAlreadyInitialized,

    #[error("Database pool is not initialized")]
    PoolNotInitialized,

    #[error("Unsupported database type: {0}")]
    UnsupportedDatabaseType(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),
}

/// Pool settings, read from `DB_*` environment variables
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub db_type: DatabaseType,
    pub sqlite_path: String,
    /// Idle connections kept open
    pub pool_size: u32,
    pub max_connections: u32,
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::Sqlite,
            sqlite_path: DEFAULT_SQLITE_PATH.to_string(),
            pool_size: 5,
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

/// Parse an environment variable, keeping `default` when unset or malformed
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, DatabaseError> {
        let defaults = Self::default();

        let db_type = match env::var("DB_TYPE") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.db_type,
        };

        let config = DatabaseConfig {
            db_type,
            sqlite_path: env::var("DB_SQLITE_PATH").unwrap_or(defaults.sqlite_path),
            pool_size: env_or("DB_POOL_SIZE", defaults.pool_size),
            max_connections: env_or("DB_MAX_CONNECTIONS", defaults.max_connections),
            timeout_seconds: env_or("DB_TIMEOUT_SECONDS", defaults.timeout_seconds),
        };

        info!(
            "Database configuration: path={}, pool_size={}, max_connections={}, timeout={}s",
            config.sqlite_path, config.pool_size, config.max_connections, config.timeout_seconds
        );

        Ok(config)
    }
}

/// Build the global pool from the environment and apply migrations
pub fn initialize_database_pool() -> Result<(), DatabaseError> {
    if DB_POOL.get().is_some() {
        return Err(DatabaseError::PoolAlreadyInitialized);
    }

    let config = DatabaseConfig::from_env()?;
    let pool = match config.db_type {
        DatabaseType::Sqlite => sqlite_file_pool(&config)?,
    };
    run_migrations(&pool)?;

    DB_POOL.set(pool).map_err(|_| DatabaseError::PoolAlreadyInitialized)
}

pub fn get_db_pool() -> Result<DatabasePool, DatabaseError> {
    DB_POOL.get().cloned().ok_or(DatabaseError::PoolNotInitialized)
}

fn sqlite_file_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    let path = Path::new(&config.sqlite_path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty() && !p.exists()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("Cannot create {}: {}; using an in-memory SQLite database", parent.display(), e);
            return sqlite_memory_pool(config.timeout_seconds);
        }
    }

    let manager = SqliteConnectionManager::file(path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE)
        .with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));

    let built = r2d2::Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.pool_size.min(config.max_connections)))
        .connection_timeout(Duration::from_secs(config.timeout_seconds))
        .build(manager);

    match built {
        Ok(pool) => {
            info!("SQLite pool ready at {}", path.display());
            Ok(DatabasePool::SQLite(Arc::new(pool)))
        }
        Err(e) => {
            error!("Failed to open {}: {}; using an in-memory SQLite database", path.display(), e);
            sqlite_memory_pool(config.timeout_seconds)
        }
    }
}

/// Each connection to `:memory:` is its own database, so the pool holds exactly one
fn sqlite_memory_pool(timeout_seconds: u64) -> Result<DatabasePool, DatabaseError> {
    let manager = SqliteConnectionManager::memory().with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS));

    let pool = r2d2::Pool::builder()
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connection_timeout(Duration::from_secs(timeout_seconds))
        .build(manager)?;

    Ok(DatabasePool::SQLite(Arc::new(pool)))
}

/// Standalone migrated in-memory pool, not registered globally
pub fn create_in_memory_pool() -> Result<DatabasePool, DatabaseError> {
    let pool = sqlite_memory_pool(DatabaseConfig::default().timeout_seconds)?;
    run_migrations(&pool)?;
    Ok(pool)
}

fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    let DatabasePool::SQLite(pool) = pool;
    let conn = pool.get()?;
    run_sqlite_migrations(&conn).map_err(DatabaseError::MigrationError)?;
    info!("Database migrations applied");
    Ok(())
}

/// Human-readable description of the global pool for health reporting.
/// `None` when no pool was initialized; contains "connection error" when the
/// pool cannot hand out a connection.
pub fn get_connection_info() -> Option<String> {
    let DatabasePool::SQLite(pool) = DB_POOL.get()?;

    let conn = match pool.get() {
        Ok(conn) => conn,
        Err(e) => {
            error!("Failed to get SQLite connection: {}", e);
            return Some(format!("SQLite connection error: {}", e));
        }
    };

    let location = match conn.query_row("PRAGMA database_list", [], |row| row.get::<_, String>(2)) {
        Ok(path) if path.is_empty() => "SQLite in-memory database".to_string(),
        Ok(path) => format!("SQLite database at {}", path),
        Err(_) => "SQLite database (path unknown)".to_string(),
    };

    let state = pool.state();
    Some(format!(
        "{} (connections: open={}, idle={})",
        location, state.connections, state.idle_connections
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_parsing() {
        assert_eq!("sqlite".parse::<DatabaseType>().unwrap(), DatabaseType::Sqlite);
        assert_eq!(" SQLite ".parse::<DatabaseType>().unwrap(), DatabaseType::Sqlite);
        assert!(matches!(
            "postgres".parse::<DatabaseType>(),
            Err(DatabaseError::UnsupportedDatabaseType(t)) if t == "postgres"
        ));
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("HEALTHLOG_TEST_POOL_SIZE", "many");
        assert_eq!(env_or("HEALTHLOG_TEST_POOL_SIZE", 5u32), 5);
        std::env::set_var("HEALTHLOG_TEST_POOL_SIZE", "8");
        assert_eq!(env_or("HEALTHLOG_TEST_POOL_SIZE", 5u32), 8);
        assert_eq!(env_or("HEALTHLOG_TEST_UNSET_KEY", 30u64), 30);
    }

    #[test]
    fn test_in_memory_pool_has_schema() {
        let DatabasePool::SQLite(pool) = create_in_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);

        let busy_timeout: i64 = conn.query_row("PRAGMA busy_timeout", [], |row| row.get(0)).unwrap();
        assert_eq!(busy_timeout, 5000);
    }
}
