// Testing utilities and mock implementations for the domain layer
// Only available with the "mock" feature

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;

pub use health_log_data::repository::mocks::{MockMeasurementRepository, MockUserRepository};

use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth, SystemStatus};
use crate::services::account::{AccountService, AccountServiceTrait};
use crate::services::measurement::{MeasurementService, MeasurementServiceTrait};
use crate::services::profile::{ProfileService, ProfileServiceTrait};

/// Health service with a fixed answer
#[derive(Debug, Clone)]
pub struct MockHealthService {
    database_up: bool,
}

impl MockHealthService {
    pub fn healthy() -> Self {
        Self { database_up: true }
    }

    /// Reports the in-memory fallback
    pub fn degraded() -> Self {
        Self { database_up: false }
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let (status, component) = if self.database_up {
            (SystemStatus::Healthy, HealthComponent { status: ComponentStatus::Healthy, details: None })
        } else {
            (
                SystemStatus::Degraded,
                HealthComponent {
                    status: ComponentStatus::Degraded,
                    details: Some("Using in-memory storage".to_string()),
                },
            )
        };

        let mut components = HashMap::new();
        components.insert("database".to_string(), component);
        SystemHealth { status, components }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        Ok(self.database_up)
    }
}

/// The three services wired over one set of mock repositories, so an account
/// created through `accounts` is visible to `profiles` and `measurements`
pub struct MockServices {
    pub accounts: Arc<dyn AccountServiceTrait + Send + Sync>,
    pub profiles: Arc<dyn ProfileServiceTrait + Send + Sync>,
    pub measurements: Arc<dyn MeasurementServiceTrait + Send + Sync>,
}

pub fn create_mock_services() -> MockServices {
    build(MockMeasurementRepository::new())
}

/// Like [`create_mock_services`] but every measurement write fails in storage
pub fn create_failing_mock_services() -> MockServices {
    build(MockMeasurementRepository::failing())
}

fn build(measurements: MockMeasurementRepository) -> MockServices {
    let users = Arc::new(MockUserRepository::new());

    MockServices {
        accounts: Arc::new(AccountService::new(Arc::clone(&users))),
        profiles: Arc::new(ProfileService::new(Arc::clone(&users))),
        measurements: Arc::new(MeasurementService::new(measurements, users)),
    }
}
