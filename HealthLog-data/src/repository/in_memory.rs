use std::sync::{Arc, Mutex};
use std::collections::HashMap;
use once_cell::sync::Lazy;

use crate::models::measurement::{Measurement, MeasurementFilter};
use crate::models::user::{ProfileUpdate, User};
use super::errors::RepositoryError;
use super::storage::{DUPLICATE_DAY, DUPLICATE_EMAIL};

/// In-memory storage used when no database pool is configured.
///
/// Uniqueness checks and writes happen under the same guard, so concurrent
/// submissions for one day cannot both succeed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    measurements: Arc<Mutex<HashMap<String, Measurement>>>,
    users: Arc<Mutex<HashMap<String, User>>>,
}

static SHARED_STORAGE: Lazy<InMemoryStorage> = Lazy::new(InMemoryStorage::new);

impl InMemoryStorage {
    /// Create a new, empty in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the process-wide storage, so separate repositories see the same rows
    pub fn shared() -> Self {
        SHARED_STORAGE.clone()
    }

    pub async fn insert_measurement(&self, measurement: &Measurement) -> Result<(), RepositoryError> {
        let mut store = self.measurements.lock()?;

        let taken = store.values().any(|m| {
            m.user_id == measurement.user_id && m.measured_on == measurement.measured_on
        });
        if taken {
            return Err(RepositoryError::Conflict(DUPLICATE_DAY.to_string()));
        }

        store.insert(measurement.id.clone(), measurement.clone());
        Ok(())
    }

    pub async fn get_measurement(&self, user_id: &str, id: &str) -> Result<Option<Measurement>, RepositoryError> {
        let store = self.measurements.lock()?;
        Ok(store.get(id).filter(|m| m.user_id == user_id).cloned())
    }

    pub async fn latest_measurement(&self, user_id: &str) -> Result<Option<Measurement>, RepositoryError> {
        let store = self.measurements.lock()?;
        Ok(store
            .values()
            .filter(|m| m.user_id == user_id)
            .max_by(|a, b| a.timestamp.cmp(&b.timestamp))
            .cloned())
    }

    pub async fn list_measurements(
        &self,
        user_id: &str,
        filter: &MeasurementFilter,
    ) -> Result<(Vec<Measurement>, usize), RepositoryError> {
        let store = self.measurements.lock()?;
        let sort_desc = filter.sort_desc.unwrap_or(true);

        let mut measurements: Vec<Measurement> = store
            .values()
            .filter(|m| m.user_id == user_id)
            .filter(|m| filter.start.as_deref().map_or(true, |start| m.timestamp.as_str() >= start))
            .filter(|m| filter.end.as_deref().map_or(true, |end| m.timestamp.as_str() <= end))
            .cloned()
            .collect();

        measurements.sort_by(|a, b| {
            let cmp = a.timestamp.cmp(&b.timestamp);
            if sort_desc { cmp.reverse() } else { cmp }
        });

        let total = measurements.len();
        let page = measurements
            .into_iter()
            .skip(filter.offset.unwrap_or(0))
            .take(filter.limit.unwrap_or(100))
            .collect();

        Ok((page, total))
    }

    pub async fn update_measurement(&self, measurement: &Measurement) -> Result<(), RepositoryError> {
        let mut store = self.measurements.lock()?;

        match store.get(&measurement.id) {
            Some(existing) if existing.user_id == measurement.user_id => {},
            _ => return Err(RepositoryError::NotFound(measurement.id.clone())),
        }

        let taken = store.values().any(|m| {
            m.id != measurement.id
                && m.user_id == measurement.user_id
                && m.measured_on == measurement.measured_on
        });
        if taken {
            return Err(RepositoryError::Conflict(DUPLICATE_DAY.to_string()));
        }

        store.insert(measurement.id.clone(), measurement.clone());
        Ok(())
    }

    pub async fn delete_measurement(&self, user_id: &str, id: &str) -> Result<bool, RepositoryError> {
        let mut store = self.measurements.lock()?;
        if store.get(id).map_or(false, |m| m.user_id == user_id) {
            store.remove(id);
            return Ok(true);
        }
        Ok(false)
    }

    pub async fn insert_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut store = self.users.lock()?;

        if store.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(RepositoryError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        store.insert(user.id.clone(), user.clone());
        Ok(())
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        let store = self.users.lock()?;
        Ok(store.get(id).cloned())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let store = self.users.lock()?;
        Ok(store.values().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    pub async fn update_profile(&self, id: &str, profile: &ProfileUpdate, updated_at: &str) -> Result<(), RepositoryError> {
        let mut store = self.users.lock()?;
        let user = store
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        user.name = profile.name.clone();
        user.gender = profile.gender.clone();
        user.date_of_birth = profile.date_of_birth.clone();
        user.height = profile.height;
        user.updated_at = updated_at.to_string();
        Ok(())
    }
}
