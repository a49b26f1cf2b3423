//! Liveness reporting for the storage layer

use std::collections::HashMap;

use async_trait::async_trait;
use health_log_data::database;

/// Rolled-up state of the whole service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemStatus {
    Healthy,
    /// Serving requests, but something is running in a reduced mode
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl From<ComponentStatus> for SystemStatus {
    fn from(status: ComponentStatus) -> Self {
        match status {
            ComponentStatus::Healthy => SystemStatus::Healthy,
            ComponentStatus::Degraded => SystemStatus::Degraded,
            ComponentStatus::Unhealthy => SystemStatus::Unhealthy,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthComponent {
    pub status: ComponentStatus,
    pub details: Option<String>,
}

impl HealthComponent {
    fn new(status: ComponentStatus, details: Option<String>) -> Self {
        Self { status, details }
    }
}

#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub status: SystemStatus,
    /// Keyed by component name, currently only `database`
    pub components: HashMap<String, HealthComponent>,
}

#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    async fn get_system_health(&self) -> SystemHealth;

    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Reports on the process-wide database pool
#[derive(Debug, Clone, Default)]
pub struct HealthService;

#[async_trait]
impl HealthServiceTrait for HealthService {
    async fn get_system_health(&self) -> SystemHealth {
        get_system_health().await
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        check_database_status().await
    }
}

/// `Ok(true)` when the pool hands out connections, `Ok(false)` when none was
/// configured and storage is in memory, `Err` when the pool is unusable
pub async fn check_database_status() -> Result<bool, String> {
    match database::get_connection_info() {
        None => Ok(false),
        Some(info) if info.contains("connection error") => Err(info),
        Some(_) => Ok(true),
    }
}

pub async fn get_system_health() -> SystemHealth {
    let database = match check_database_status().await {
        Ok(true) => HealthComponent::new(ComponentStatus::Healthy, database::get_connection_info()),
        Ok(false) => HealthComponent::new(
            ComponentStatus::Degraded,
            Some("No database configured, data is kept in memory".to_string()),
        ),
        Err(reason) => HealthComponent::new(ComponentStatus::Unhealthy, Some(reason)),
    };

    SystemHealth {
        status: database.status.into(),
        components: HashMap::from([("database".to_string(), database)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_storage_reports_degraded() {
        // Unit tests never initialize the global pool
        let health = HealthService.get_system_health().await;

        assert_eq!(health.status, SystemStatus::Degraded);
        assert_eq!(health.components["database"].status, ComponentStatus::Degraded);
        assert_eq!(HealthService.check_database_status().await, Ok(false));
    }

    #[test]
    fn test_component_status_rolls_up() {
        assert_eq!(SystemStatus::from(ComponentStatus::Unhealthy), SystemStatus::Unhealthy);
        assert_eq!(SystemStatus::from(ComponentStatus::Healthy), SystemStatus::Healthy);
    }
}
