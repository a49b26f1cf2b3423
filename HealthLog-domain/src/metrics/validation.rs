use serde::{Deserialize, Serialize};
use std::fmt;

use super::MetricsError;

/// Fields checked by the plausibility validator, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricField {
    Bmi,
    Bmr,
    BodyFatPercentage,
    VisceralFat,
}

impl MetricField {
    /// Inclusive plausible range
    pub fn range(&self) -> (f64, f64) {
        match self {
            MetricField::Bmi => (10.0, 50.0),
            MetricField::Bmr => (800.0, 3000.0),
            MetricField::BodyFatPercentage => (3.0, 60.0),
            MetricField::VisceralFat => (1.0, 60.0),
        }
    }

    /// User-facing message for a value outside the range
    pub fn out_of_range_message(&self) -> &'static str {
        match self {
            MetricField::Bmi => "BMI อยู่นอกช่วงที่เป็นไปได้",
            MetricField::Bmr => "BMR อยู่นอกช่วงที่เป็นไปได้",
            MetricField::BodyFatPercentage => "เปอร์เซ็นต์ไขมันอยู่นอกช่วงที่เป็นไปได้",
            MetricField::VisceralFat => "ไขมันในช่องท้องอยู่นอกช่วงที่เป็นไปได้",
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricField::Bmi => "bmi",
            MetricField::Bmr => "bmr",
            MetricField::BodyFatPercentage => "bodyFatPercentage",
            MetricField::VisceralFat => "visceralFat",
        };
        f.write_str(name)
    }
}

/// Partial metrics to validate; absent fields are skipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetricsInput {
    pub bmi: Option<f64>,
    pub bmr: Option<i32>,
    pub body_fat_percentage: Option<f64>,
    pub visceral_fat: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Every present field outside its plausible range, in reporting order
pub fn range_violations(input: &HealthMetricsInput) -> Vec<MetricsError> {
    let fields = [
        (MetricField::Bmi, input.bmi),
        (MetricField::Bmr, input.bmr.map(f64::from)),
        (MetricField::BodyFatPercentage, input.body_fat_percentage),
        (MetricField::VisceralFat, input.visceral_fat),
    ];

    fields
        .into_iter()
        .filter_map(|(field, value)| {
            let value = value?;
            let (min, max) = field.range();
            // NaN fails both comparisons, so test for inclusion
            if (min..=max).contains(&value) {
                None
            } else {
                Some(MetricsError::InvalidRange { field, value, min, max })
            }
        })
        .collect()
}

/// Advisory plausibility check producing one message per violation
pub fn validate_health_metrics(input: &HealthMetricsInput) -> ValidationResult {
    let errors: Vec<String> = range_violations(input)
        .iter()
        .filter_map(|violation| match violation {
            MetricsError::InvalidRange { field, .. } => Some(field.out_of_range_message().to_string()),
            _ => None,
        })
        .collect();

    ValidationResult {
        valid: errors.is_empty(),
        errors,
    }
}
