// HealthLog domain
// Business logic for the HealthLog application: the health metrics engine,
// domain entities, services and authentication.

// Pure calculation and validation functions
pub mod metrics;

// Services that implement business logic
pub mod services;

// Authentication
pub mod auth;

// Domain entities
pub mod entities;

// Health checks and system status
pub mod health;

// Re-export the database module from the data crate for convenience
pub use health_log_data::database;

// Testing utilities - only available with mock feature
#[cfg(feature = "mock")]
pub mod testing;
