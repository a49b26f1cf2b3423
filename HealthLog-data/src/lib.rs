// HealthLog Data
// This crate handles persistence for accounts, profiles and measurements

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Data storage models
pub mod models;
