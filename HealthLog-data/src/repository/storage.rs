use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::models::measurement::{Measurement, MeasurementFilter};
use crate::models::user::{ProfileUpdate, User};
use crate::database::DatabasePool;
use super::errors::RepositoryError;

pub(crate) const DUPLICATE_DAY: &str = "a measurement already exists for this day";
pub(crate) const DUPLICATE_EMAIL: &str = "email is already registered";

const MEASUREMENT_COLUMNS: &str = "id, user_id, timestamp, measured_on, weight, body_fat_percentage, \
     muscle_mass, visceral_fat, bmi, bmr, created_at, updated_at";

const USER_COLUMNS: &str =
    "id, email, password_hash, name, gender, date_of_birth, height, created_at, updated_at";

fn measurement_from_row(row: &Row<'_>) -> rusqlite::Result<Measurement> {
    Ok(Measurement {
        id: row.get(0)?,
        user_id: row.get(1)?,
        timestamp: row.get(2)?,
        measured_on: row.get(3)?,
        weight: row.get(4)?,
        body_fat_percentage: row.get(5)?,
        muscle_mass: row.get(6)?,
        visceral_fat: row.get(7)?,
        bmi: row.get(8)?,
        bmr: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        name: row.get(3)?,
        gender: row.get(4)?,
        date_of_birth: row.get(5)?,
        height: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Database storage operations for accounts and measurements
pub struct DatabaseStorage;

impl DatabaseStorage {
    /// Insert a measurement. The unique (user_id, measured_on) index turns a
    /// second entry for the same day into a `Conflict`.
    pub async fn insert_measurement(pool: &DatabasePool, measurement: &Measurement) -> Result<(), RepositoryError> {
        debug!("Storing measurement in database: id={}", measurement.id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                conn.execute(
                    &format!("INSERT INTO measurements ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)", MEASUREMENT_COLUMNS),
                    params![
                        measurement.id,
                        measurement.user_id,
                        measurement.timestamp,
                        measurement.measured_on,
                        measurement.weight,
                        measurement.body_fat_percentage,
                        measurement.muscle_mass,
                        measurement.visceral_fat,
                        measurement.bmi,
                        measurement.bmr,
                        measurement.created_at,
                        measurement.updated_at,
                    ],
                ).map_err(|e| RepositoryError::from_sqlite_write(e, DUPLICATE_DAY))?;

                Ok(())
            },
        }
    }

    /// Get one of a user's measurements by ID
    pub async fn get_measurement(pool: &DatabasePool, user_id: &str, id: &str) -> Result<Option<Measurement>, RepositoryError> {
        debug!("Getting measurement by ID from database: id={}", id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let measurement = conn.query_row(
                    &format!("SELECT {} FROM measurements WHERE id = ?1 AND user_id = ?2", MEASUREMENT_COLUMNS),
                    params![id, user_id],
                    measurement_from_row,
                ).optional()?;

                Ok(measurement)
            },
        }
    }

    /// Get the newest measurement of a user
    pub async fn latest_measurement(pool: &DatabasePool, user_id: &str) -> Result<Option<Measurement>, RepositoryError> {
        debug!("Getting latest measurement from database for user {}", user_id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let measurement = conn.query_row(
                    &format!("SELECT {} FROM measurements WHERE user_id = ?1 ORDER BY timestamp DESC LIMIT 1", MEASUREMENT_COLUMNS),
                    params![user_id],
                    measurement_from_row,
                ).optional()?;

                Ok(measurement)
            },
        }
    }

    /// Get a page of a user's measurements along with the total match count
    pub async fn list_measurements(
        pool: &DatabasePool,
        user_id: &str,
        filter: &MeasurementFilter,
    ) -> Result<(Vec<Measurement>, usize), RepositoryError> {
        debug!("Getting filtered measurements from database");

        let sort_direction = if filter.sort_desc.unwrap_or(true) { "DESC" } else { "ASC" };
        let limit_val = filter.limit.unwrap_or(100);
        let offset_val = i64::try_from(filter.offset.unwrap_or(0)).unwrap_or(i64::MAX);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let mut where_clauses = vec!["user_id = ?"];
                let mut params: Vec<&dyn rusqlite::ToSql> = vec![&user_id];

                if let Some(ref start) = filter.start {
                    where_clauses.push("timestamp >= ?");
                    params.push(start);
                }

                if let Some(ref end) = filter.end {
                    where_clauses.push("timestamp <= ?");
                    params.push(end);
                }

                let where_sql = where_clauses.join(" AND ");

                let query = format!(
                    "SELECT {} FROM measurements WHERE {} ORDER BY timestamp {} LIMIT {} OFFSET {}",
                    MEASUREMENT_COLUMNS, where_sql, sort_direction, limit_val, offset_val
                );

                let mut stmt = conn.prepare(&query)?;
                let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), measurement_from_row)?;

                let mut result = Vec::new();
                for measurement in rows {
                    result.push(measurement?);
                }

                let count_query = format!("SELECT COUNT(*) FROM measurements WHERE {}", where_sql);
                let total: i64 = conn.query_row(
                    &count_query,
                    rusqlite::params_from_iter(params.iter()),
                    |row| row.get(0),
                )?;

                Ok((result, total as usize))
            },
        }
    }

    /// Overwrite the mutable columns of a measurement
    pub async fn update_measurement(pool: &DatabasePool, measurement: &Measurement) -> Result<(), RepositoryError> {
        debug!("Updating measurement in database: id={}", measurement.id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let changed = conn.execute(
                    "UPDATE measurements SET timestamp = ?1, measured_on = ?2, weight = ?3,
                        body_fat_percentage = ?4, muscle_mass = ?5, visceral_fat = ?6,
                        bmi = ?7, bmr = ?8, updated_at = ?9
                     WHERE id = ?10 AND user_id = ?11",
                    params![
                        measurement.timestamp,
                        measurement.measured_on,
                        measurement.weight,
                        measurement.body_fat_percentage,
                        measurement.muscle_mass,
                        measurement.visceral_fat,
                        measurement.bmi,
                        measurement.bmr,
                        measurement.updated_at,
                        measurement.id,
                        measurement.user_id,
                    ],
                ).map_err(|e| RepositoryError::from_sqlite_write(e, DUPLICATE_DAY))?;

                if changed == 0 {
                    return Err(RepositoryError::NotFound(measurement.id.clone()));
                }

                Ok(())
            },
        }
    }

    /// Delete a measurement, returning whether a row was removed
    pub async fn delete_measurement(pool: &DatabasePool, user_id: &str, id: &str) -> Result<bool, RepositoryError> {
        debug!("Deleting measurement from database: id={}", id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let changed = conn.execute(
                    "DELETE FROM measurements WHERE id = ?1 AND user_id = ?2",
                    params![id, user_id],
                )?;
                Ok(changed > 0)
            },
        }
    }

    /// Insert an account. Emails are unique regardless of case.
    pub async fn insert_user(pool: &DatabasePool, user: &User) -> Result<(), RepositoryError> {
        debug!("Storing user in database: id={}", user.id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                conn.execute(
                    &format!("INSERT INTO users ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)", USER_COLUMNS),
                    params![
                        user.id,
                        user.email,
                        user.password_hash,
                        user.name,
                        user.gender,
                        user.date_of_birth,
                        user.height,
                        user.created_at,
                        user.updated_at,
                    ],
                ).map_err(|e| RepositoryError::from_sqlite_write(e, DUPLICATE_EMAIL))?;

                Ok(())
            },
        }
    }

    pub async fn get_user_by_id(pool: &DatabasePool, id: &str) -> Result<Option<User>, RepositoryError> {
        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let user = conn.query_row(
                    &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                    params![id],
                    user_from_row,
                ).optional()?;
                Ok(user)
            },
        }
    }

    pub async fn get_user_by_email(pool: &DatabasePool, email: &str) -> Result<Option<User>, RepositoryError> {
        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;
                let user = conn.query_row(
                    &format!("SELECT {} FROM users WHERE email = ?1 COLLATE NOCASE", USER_COLUMNS),
                    params![email],
                    user_from_row,
                ).optional()?;
                Ok(user)
            },
        }
    }

    /// Write the profile columns of an account
    pub async fn update_profile(
        pool: &DatabasePool,
        id: &str,
        profile: &ProfileUpdate,
        updated_at: &str,
    ) -> Result<(), RepositoryError> {
        debug!("Updating profile in database: id={}", id);

        match pool {
            DatabasePool::SQLite(pool) => {
                let conn = pool.get()?;

                let changed = conn.execute(
                    "UPDATE users SET name = ?1, gender = ?2, date_of_birth = ?3, height = ?4, updated_at = ?5
                     WHERE id = ?6",
                    params![
                        profile.name,
                        profile.gender,
                        profile.date_of_birth,
                        profile.height,
                        updated_at,
                        id,
                    ],
                )?;

                if changed == 0 {
                    return Err(RepositoryError::NotFound(id.to_string()));
                }

                Ok(())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_in_memory_pool;

    fn sample(id: &str, user_id: &str, timestamp: &str) -> Measurement {
        Measurement {
            id: id.to_string(),
            user_id: user_id.to_string(),
            timestamp: timestamp.to_string(),
            measured_on: timestamp[..10].to_string(),
            weight: 70.0,
            body_fat_percentage: 20.0,
            muscle_mass: 30.0,
            visceral_fat: None,
            bmi: Some(22.9),
            bmr: Some(1629),
            created_at: timestamp.to_string(),
            updated_at: timestamp.to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_day_is_conflict() {
        let pool = create_in_memory_pool().unwrap();
        DatabaseStorage::insert_measurement(&pool, &sample("a", "u1", "2024-03-01T07:00:00+00:00")).await.unwrap();

        let result = DatabaseStorage::insert_measurement(&pool, &sample("b", "u1", "2024-03-01T19:00:00+00:00")).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));

        // Another user may log the same day
        DatabaseStorage::insert_measurement(&pool, &sample("c", "u2", "2024-03-01T07:00:00+00:00")).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_is_scoped_paginated_and_sorted() {
        let pool = create_in_memory_pool().unwrap();
        for (i, day) in ["01", "02", "03", "04"].iter().enumerate() {
            let ts = format!("2024-03-{}T08:00:00+00:00", day);
            DatabaseStorage::insert_measurement(&pool, &sample(&format!("m{}", i), "u1", &ts)).await.unwrap();
        }
        DatabaseStorage::insert_measurement(&pool, &sample("other", "u2", "2024-03-05T08:00:00+00:00")).await.unwrap();

        let filter = MeasurementFilter { limit: Some(2), offset: Some(1), ..Default::default() };
        let (page, total) = DatabaseStorage::list_measurements(&pool, "u1", &filter).await.unwrap();
        assert_eq!(total, 4);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].measured_on, "2024-03-03");
        assert_eq!(page[1].measured_on, "2024-03-02");

        let filter = MeasurementFilter {
            start: Some("2024-03-02T00:00:00+00:00".to_string()),
            end: Some("2024-03-03T23:59:59+00:00".to_string()),
            sort_desc: Some(false),
            ..Default::default()
        };
        let (page, total) = DatabaseStorage::list_measurements(&pool, "u1", &filter).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(page[0].measured_on, "2024-03-02");
    }

    #[tokio::test]
    async fn test_offset_beyond_sqlite_range_yields_empty_page() {
        let pool = create_in_memory_pool().unwrap();
        DatabaseStorage::insert_measurement(&pool, &sample("a", "u1", "2024-03-01T08:00:00+00:00")).await.unwrap();

        let filter = MeasurementFilter { offset: Some(usize::MAX), ..Default::default() };
        let (page, total) = DatabaseStorage::list_measurements(&pool, "u1", &filter).await.unwrap();
        assert_eq!(total, 1);
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_respect_owner() {
        let pool = create_in_memory_pool().unwrap();
        let mut m = sample("a", "u1", "2024-03-01T07:00:00+00:00");
        DatabaseStorage::insert_measurement(&pool, &m).await.unwrap();

        m.weight = 71.5;
        m.bmi = None;
        DatabaseStorage::update_measurement(&pool, &m).await.unwrap();
        let stored = DatabaseStorage::get_measurement(&pool, "u1", "a").await.unwrap().unwrap();
        assert_eq!(stored.weight, 71.5);
        assert_eq!(stored.bmi, None);

        assert!(DatabaseStorage::get_measurement(&pool, "u2", "a").await.unwrap().is_none());
        assert!(!DatabaseStorage::delete_measurement(&pool, "u2", "a").await.unwrap());
        assert!(DatabaseStorage::delete_measurement(&pool, "u1", "a").await.unwrap());
        assert!(DatabaseStorage::latest_measurement(&pool, "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_is_unique_case_insensitive() {
        let pool = create_in_memory_pool().unwrap();
        let user = User {
            id: "u1".to_string(),
            email: "ann@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: None,
            gender: None,
            date_of_birth: None,
            height: None,
            created_at: "now".to_string(),
            updated_at: "now".to_string(),
        };
        DatabaseStorage::insert_user(&pool, &user).await.unwrap();

        let duplicate = User { id: "u2".to_string(), email: "ANN@example.com".to_string(), ..user.clone() };
        let result = DatabaseStorage::insert_user(&pool, &duplicate).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));

        let found = DatabaseStorage::get_user_by_email(&pool, "Ann@Example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some("u1".to_string()));

        let profile = ProfileUpdate { height: Some(175.0), gender: Some("male".to_string()), ..Default::default() };
        DatabaseStorage::update_profile(&pool, "u1", &profile, "later").await.unwrap();
        let stored = DatabaseStorage::get_user_by_id(&pool, "u1").await.unwrap().unwrap();
        assert_eq!(stored.height, Some(175.0));
        assert_eq!(stored.updated_at, "later");
    }
}
