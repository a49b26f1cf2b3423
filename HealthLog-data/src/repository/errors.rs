use std::sync::PoisonError;
use thiserror::Error;
use crate::database::DatabaseError;

/// Error type for repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Lock error
    #[error("Lock error: {0}")]
    Lock(String),

    /// Not found error
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A uniqueness rule was violated (duplicate day, duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl<T> From<PoisonError<T>> for RepositoryError {
    fn from(error: PoisonError<T>) -> Self {
        RepositoryError::Lock(error.to_string())
    }
}

impl RepositoryError {
    /// Map a SQLite constraint violation to `Conflict`, keeping other errors as-is
    pub(crate) fn from_sqlite_write(error: rusqlite::Error, conflict: &str) -> Self {
        match error {
            rusqlite::Error::SqliteFailure(ref e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                RepositoryError::Conflict(conflict.to_string())
            }
            other => RepositoryError::Sqlite(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_violation_maps_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT PRIMARY KEY); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES ('a')", []).unwrap_err();

        let mapped = RepositoryError::from_sqlite_write(err, "duplicate key");
        assert!(matches!(mapped, RepositoryError::Conflict(ref m) if m == "duplicate key"));
    }

    #[test]
    fn test_poison_error_converts_to_lock() {
        let mutex = std::sync::Arc::new(std::sync::Mutex::new(0));
        let cloned = mutex.clone();
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock().unwrap();
            panic!("poison");
        })
        .join();

        let err: RepositoryError = mutex.lock().unwrap_err().into();
        assert!(matches!(err, RepositoryError::Lock(_)));
    }
}
