use chrono::Utc;
use tracing::debug;
use uuid::Uuid;
use async_trait::async_trait;

use crate::models::measurement::{Measurement, MeasurementFilter, NewMeasurement};
use crate::database::get_db_pool;
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for body-composition measurements. Every operation is
/// scoped to the owning user.
#[async_trait]
pub trait MeasurementRepositoryTrait {
    /// Insert a measurement; a second entry for the same user and day is a `Conflict`
    async fn create(&self, measurement: NewMeasurement) -> Result<Measurement, RepositoryError>;

    async fn get_by_id(&self, user_id: &str, id: Uuid) -> Result<Option<Measurement>, RepositoryError>;

    async fn get_latest(&self, user_id: &str) -> Result<Option<Measurement>, RepositoryError>;

    /// Get a page of measurements and the total number matching the filter
    async fn get_filtered(
        &self,
        user_id: &str,
        filter: MeasurementFilter,
    ) -> Result<(Vec<Measurement>, usize), RepositoryError>;

    /// Overwrite an existing measurement; `updated_at` is set by the repository
    async fn update(&self, measurement: Measurement) -> Result<Measurement, RepositoryError>;

    /// Delete a measurement, returning whether it existed
    async fn delete(&self, user_id: &str, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Repository for measurements backed by the global SQLite pool, or by
/// in-memory storage when no pool has been initialized.
#[derive(Debug, Clone, Default)]
pub struct MeasurementRepository {
    storage: InMemoryStorage,
}

impl MeasurementRepository {
    /// Repository with its own private fallback storage
    pub fn new() -> Self {
        Self {
            storage: InMemoryStorage::new(),
        }
    }

    /// Repository whose fallback storage is shared process-wide
    pub fn shared() -> Self {
        Self {
            storage: InMemoryStorage::shared(),
        }
    }
}

#[async_trait]
impl MeasurementRepositoryTrait for MeasurementRepository {
    async fn create(&self, new: NewMeasurement) -> Result<Measurement, RepositoryError> {
        let now = Utc::now().to_rfc3339();
        let measurement = Measurement {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            timestamp: new.timestamp,
            measured_on: new.measured_on,
            weight: new.weight,
            body_fat_percentage: new.body_fat_percentage,
            muscle_mass: new.muscle_mass,
            visceral_fat: new.visceral_fat,
            bmi: new.bmi,
            bmr: new.bmr,
            created_at: now.clone(),
            updated_at: now,
        };

        match get_db_pool() {
            Ok(pool) => {
                debug!("Storing measurement in database: {}", measurement.id);
                DatabaseStorage::insert_measurement(&pool, &measurement).await?;
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage", e);
                self.storage.insert_measurement(&measurement).await?;
            }
        }

        Ok(measurement)
    }

    async fn get_by_id(&self, user_id: &str, id: Uuid) -> Result<Option<Measurement>, RepositoryError> {
        let id = id.to_string();
        match get_db_pool() {
            Ok(pool) => DatabaseStorage::get_measurement(&pool, user_id, &id).await,
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for get_by_id", e);
                self.storage.get_measurement(user_id, &id).await
            }
        }
    }

    async fn get_latest(&self, user_id: &str) -> Result<Option<Measurement>, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => DatabaseStorage::latest_measurement(&pool, user_id).await,
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for get_latest", e);
                self.storage.latest_measurement(user_id).await
            }
        }
    }

    async fn get_filtered(
        &self,
        user_id: &str,
        filter: MeasurementFilter,
    ) -> Result<(Vec<Measurement>, usize), RepositoryError> {
        match get_db_pool() {
            Ok(pool) => DatabaseStorage::list_measurements(&pool, user_id, &filter).await,
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for get_filtered", e);
                self.storage.list_measurements(user_id, &filter).await
            }
        }
    }

    async fn update(&self, mut measurement: Measurement) -> Result<Measurement, RepositoryError> {
        measurement.updated_at = Utc::now().to_rfc3339();

        match get_db_pool() {
            Ok(pool) => DatabaseStorage::update_measurement(&pool, &measurement).await?,
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for update", e);
                self.storage.update_measurement(&measurement).await?
            }
        }

        Ok(measurement)
    }

    async fn delete(&self, user_id: &str, id: Uuid) -> Result<bool, RepositoryError> {
        let id = id.to_string();
        match get_db_pool() {
            Ok(pool) => DatabaseStorage::delete_measurement(&pool, user_id, &id).await,
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for delete", e);
                self.storage.delete_measurement(user_id, &id).await
            }
        }
    }
}

/// Mock measurement repository for testing
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock implementation of MeasurementRepositoryTrait backed by a vector.
    /// Enforces the one-entry-per-day rule like the real storage.
    #[derive(Default)]
    pub struct MockMeasurementRepository {
        measurements: Mutex<Vec<Measurement>>,
        fail_writes: bool,
    }

    impl MockMeasurementRepository {
        /// Create a new empty mock repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock repository with predefined measurements
        pub fn with_measurements(measurements: Vec<Measurement>) -> Self {
            Self {
                measurements: Mutex::new(measurements),
                fail_writes: false,
            }
        }

        /// Make every write fail with a storage error
        pub fn failing() -> Self {
            Self {
                measurements: Mutex::new(Vec::new()),
                fail_writes: true,
            }
        }

        /// Snapshot of the stored measurements
        pub fn stored(&self) -> Vec<Measurement> {
            self.measurements.lock().map(|m| m.clone()).unwrap_or_default()
        }

        fn check_writable(&self) -> Result<(), RepositoryError> {
            if self.fail_writes {
                return Err(RepositoryError::Lock("mock storage unavailable".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl MeasurementRepositoryTrait for MockMeasurementRepository {
        async fn create(&self, new: NewMeasurement) -> Result<Measurement, RepositoryError> {
            self.check_writable()?;
            let mut store = self.measurements.lock()?;
            if store.iter().any(|m| m.user_id == new.user_id && m.measured_on == new.measured_on) {
                return Err(RepositoryError::Conflict("duplicate day".to_string()));
            }

            let measurement = Measurement {
                id: Uuid::new_v4().to_string(),
                user_id: new.user_id,
                timestamp: new.timestamp,
                measured_on: new.measured_on,
                weight: new.weight,
                body_fat_percentage: new.body_fat_percentage,
                muscle_mass: new.muscle_mass,
                visceral_fat: new.visceral_fat,
                bmi: new.bmi,
                bmr: new.bmr,
                created_at: "2024-01-01T00:00:00+00:00".to_string(),
                updated_at: "2024-01-01T00:00:00+00:00".to_string(),
            };
            store.push(measurement.clone());
            Ok(measurement)
        }

        async fn get_by_id(&self, user_id: &str, id: Uuid) -> Result<Option<Measurement>, RepositoryError> {
            let store = self.measurements.lock()?;
            Ok(store
                .iter()
                .find(|m| m.id == id.to_string() && m.user_id == user_id)
                .cloned())
        }

        async fn get_latest(&self, user_id: &str) -> Result<Option<Measurement>, RepositoryError> {
            let store = self.measurements.lock()?;
            Ok(store
                .iter()
                .filter(|m| m.user_id == user_id)
                .max_by(|a, b| a.timestamp.cmp(&b.timestamp))
                .cloned())
        }

        async fn get_filtered(
            &self,
            user_id: &str,
            filter: MeasurementFilter,
        ) -> Result<(Vec<Measurement>, usize), RepositoryError> {
            let store = self.measurements.lock()?;
            let mut filtered: Vec<Measurement> = store
                .iter()
                .filter(|m| m.user_id == user_id)
                .filter(|m| filter.start.as_ref().map_or(true, |s| &m.timestamp >= s))
                .filter(|m| filter.end.as_ref().map_or(true, |e| &m.timestamp <= e))
                .cloned()
                .collect();

            filtered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
            if filter.sort_desc.unwrap_or(true) {
                filtered.reverse();
            }

            let total = filtered.len();
            let paged = filtered
                .into_iter()
                .skip(filter.offset.unwrap_or(0))
                .take(filter.limit.unwrap_or(usize::MAX))
                .collect();

            Ok((paged, total))
        }

        async fn update(&self, measurement: Measurement) -> Result<Measurement, RepositoryError> {
            self.check_writable()?;
            let mut store = self.measurements.lock()?;
            if store.iter().any(|m| {
                m.id != measurement.id
                    && m.user_id == measurement.user_id
                    && m.measured_on == measurement.measured_on
            }) {
                return Err(RepositoryError::Conflict("duplicate day".to_string()));
            }

            let slot = store
                .iter_mut()
                .find(|m| m.id == measurement.id && m.user_id == measurement.user_id)
                .ok_or_else(|| RepositoryError::NotFound(measurement.id.clone()))?;
            *slot = measurement.clone();
            Ok(measurement)
        }

        async fn delete(&self, user_id: &str, id: Uuid) -> Result<bool, RepositoryError> {
            self.check_writable()?;
            let mut store = self.measurements.lock()?;
            let before = store.len();
            store.retain(|m| !(m.id == id.to_string() && m.user_id == user_id));
            Ok(store.len() < before)
        }
    }
}
