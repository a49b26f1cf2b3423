//! Health Metrics Engine
//!
//! Pure calculation and validation functions over demographic and raw
//! measurement inputs. Nothing here performs I/O or holds state, so every
//! function can be called concurrently from any request.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod calculations;
pub mod categories;
pub mod validation;

pub use calculations::{
    calculate_age, calculate_age_on, calculate_bmi, calculate_bmr, calculate_bmr_on,
    calculate_tdee, estimate_weight, ideal_weight_range,
};
pub use categories::{bmi_category, body_fat_category, BmiCategory, BodyFatCategory};
pub use validation::{range_violations, validate_health_metrics, HealthMetricsInput, MetricField, ValidationResult};

/// Errors produced by the metrics engine. All of them are local and recoverable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    /// A value lies outside its physiologically plausible range
    #[error("{field} value {value} is outside [{min}, {max}]")]
    InvalidRange {
        field: MetricField,
        value: f64,
        min: f64,
        max: f64,
    },

    /// An input required by a derived calculation is absent
    #[error("missing required input: {0}")]
    MissingDependency(&'static str),

    /// A divisor reached zero
    #[error("degenerate arithmetic: {0}")]
    ArithmeticDegenerate(&'static str),
}

/// Biological sex used by the BMR equation and the body-fat ladders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(format!("unknown gender: {}", s)),
        }
    }
}

/// Physical activity level with its TDEE multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

/// Complete demographic profile needed for BMR
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    /// Height in centimeters
    pub height: f64,
}

impl Demographics {
    /// Assemble demographics from optional profile fields, naming the first
    /// missing one
    pub fn from_parts(
        gender: Option<Gender>,
        date_of_birth: Option<NaiveDate>,
        height: Option<f64>,
    ) -> Result<Self, MetricsError> {
        Ok(Self {
            gender: gender.ok_or(MetricsError::MissingDependency("gender"))?,
            date_of_birth: date_of_birth.ok_or(MetricsError::MissingDependency("dateOfBirth"))?,
            height: height.ok_or(MetricsError::MissingDependency("height"))?,
        })
    }
}

/// Minimum and maximum healthy weight for a height, in kilograms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(utoipa::ToSchema))]
pub struct WeightRange {
    pub min: f64,
    pub max: f64,
}

/// Metrics derived at write time. `None` means "not computed", which is
/// distinct from a computed zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub bmi: Option<f64>,
    pub bmr: Option<i32>,
    pub age: Option<u32>,
}

impl DerivedMetrics {
    /// Derive BMI, BMR and age for a weight as of `today`
    pub fn compute(demographics: &Demographics, weight: f64, today: NaiveDate) -> Result<Self, MetricsError> {
        let bmi = calculate_bmi(weight, demographics.height)?;
        Ok(Self {
            bmi: Some(bmi),
            bmr: Some(calculate_bmr_on(demographics, weight, today)),
            age: Some(calculate_age_on(demographics.date_of_birth, today)),
        })
    }
}

/// Round half away from zero at the tenths digit
pub(crate) fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_demographics_names_first_missing_field() {
        let err = Demographics::from_parts(Some(Gender::Male), None, None).unwrap_err();
        assert_eq!(err, MetricsError::MissingDependency("dateOfBirth"));

        let err = Demographics::from_parts(None, Some(date(1990, 1, 1)), Some(175.0)).unwrap_err();
        assert_eq!(err, MetricsError::MissingDependency("gender"));
    }

    #[test]
    fn test_derived_metrics_compute() {
        let demographics = Demographics::from_parts(Some(Gender::Male), Some(date(1990, 1, 1)), Some(175.0)).unwrap();
        let derived = DerivedMetrics::compute(&demographics, 70.0, date(2024, 6, 1)).unwrap();

        assert_eq!(derived.bmi, Some(22.9));
        assert_eq!(derived.bmr, Some(1629));
        assert_eq!(derived.age, Some(34));
    }

    #[test]
    fn test_not_computed_is_distinct_from_zero() {
        let derived = DerivedMetrics::default();
        assert_eq!(derived.bmr, None);
        assert_ne!(derived.bmr, Some(0));
    }

    #[test]
    fn test_gender_and_activity_serde() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"female\"");
        assert_eq!("other".parse::<Gender>().unwrap(), Gender::Other);
        assert!("unknown".parse::<Gender>().is_err());

        let level: ActivityLevel = serde_json::from_str("\"very-active\"").unwrap();
        assert_eq!(level, ActivityLevel::VeryActive);
        assert_eq!(ActivityLevel::default(), ActivityLevel::Sedentary);
    }

    #[test]
    fn test_round_to_tenth_half_away_from_zero() {
        assert_eq!(round_to_tenth(22.857), 22.9);
        assert_eq!(round_to_tenth(56.65625), 56.7);
        assert_eq!(round_to_tenth(-1.25), -1.3);
    }
}
