// Domain entities and value objects
pub mod account;
pub mod conversions;
pub mod measurement;
pub mod profile;

// Re-export common types for easier imports
pub use account::{Credentials, SignUpRequest};
pub use measurement::{CreateMeasurementRequest, Measurement, MeasurementInsights, UpdateMeasurementRequest};
pub use profile::{UpdateProfileRequest, UserProfile};
pub use crate::metrics::{ActivityLevel, Gender};
