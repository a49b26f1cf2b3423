use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_users_table(conn)?;
    create_measurements_table(conn)?;
    create_measurement_indexes(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Accounts and their demographic profile share one row
fn create_users_table(conn: &Connection) -> Result<(), String> {
    info!("Creating users table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password_hash TEXT NOT NULL,
            name TEXT,
            gender TEXT,
            date_of_birth TEXT,
            height REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

fn create_measurements_table(conn: &Connection) -> Result<(), String> {
    info!("Creating measurements table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS measurements (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            measured_on TEXT NOT NULL,
            weight REAL NOT NULL,
            body_fat_percentage REAL NOT NULL,
            muscle_mass REAL NOT NULL,
            visceral_fat REAL,
            bmi REAL,
            bmr INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// One entry per user per calendar day, enforced by the database
fn create_measurement_indexes(conn: &Connection) -> Result<(), String> {
    info!("Creating measurement indexes");

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_measurements_user_day
        ON measurements (user_id, measured_on)",
        [],
    ).map_err(|e| format!("Failed to create index: {}", e))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_measurements_user_timestamp
        ON measurements (user_id, timestamp DESC)",
        [],
    ).map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}
