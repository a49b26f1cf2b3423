use serde::{Deserialize, Serialize};

/// Storage model for a body-composition measurement.
///
/// Timestamps are RFC 3339 strings normalized to UTC so that lexical order is
/// chronological order. `measured_on` is the `YYYY-MM-DD` calendar day the
/// entry belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: String,
    pub user_id: String,
    pub timestamp: String,
    pub measured_on: String,

    /// Body weight in kilograms
    pub weight: f64,
    pub body_fat_percentage: f64,
    /// Muscle mass in kilograms
    pub muscle_mass: f64,
    /// Device-specific visceral fat index
    pub visceral_fat: Option<f64>,

    /// BMI computed when the entry was written
    pub bmi: Option<f64>,
    /// BMR computed when the entry was written
    pub bmr: Option<i32>,

    pub created_at: String,
    pub updated_at: String,
}

/// Input data for inserting a measurement. Identity and audit columns are
/// assigned by the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMeasurement {
    pub user_id: String,
    pub timestamp: String,
    pub measured_on: String,
    pub weight: f64,
    pub body_fat_percentage: f64,
    pub muscle_mass: f64,
    pub visceral_fat: Option<f64>,
    pub bmi: Option<f64>,
    pub bmr: Option<i32>,
}

/// Query options for listing a user's measurements
#[derive(Debug, Clone, Default)]
pub struct MeasurementFilter {
    /// Inclusive lower bound on `timestamp`
    pub start: Option<String>,
    /// Inclusive upper bound on `timestamp`
    pub end: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Newest first when true (the default)
    pub sort_desc: Option<bool>,
}
