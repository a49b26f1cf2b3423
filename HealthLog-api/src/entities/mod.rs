// Public entities for the HealthLog API
// Request and response bodies as they appear on the wire

// Pagination and plain message bodies
pub mod common;

// Signup and login
pub mod auth;

// Demographic profile
pub mod profile;

// Body-composition measurements
pub mod measurement;
