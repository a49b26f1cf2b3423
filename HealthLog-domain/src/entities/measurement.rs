use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::metrics::{ActivityLevel, BmiCategory, BodyFatCategory, WeightRange};

/// A body-composition measurement with the BMI/BMR frozen at write time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub id: Uuid,
    pub user_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Calendar day the entry counts for
    pub measured_on: NaiveDate,
    pub weight: f64,
    pub body_fat_percentage: f64,
    pub muscle_mass: f64,
    pub visceral_fat: Option<f64>,
    pub bmi: Option<f64>,
    pub bmr: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a measurement. The calendar day is taken from the
/// timestamp in the offset the client sent it with. Masses are at least
/// 0.1 kg, the resolution of a body-composition scale. Body fat and visceral
/// fat are bounded by the metrics validator alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeasurementRequest {
    /// Defaults to the current time
    pub timestamp: Option<DateTime<FixedOffset>>,

    #[validate(range(min = 0.1, max = 500.0, message = "น้ำหนักต้องอยู่ระหว่าง 0.1-500 กก."))]
    pub weight: f64,

    pub body_fat_percentage: f64,

    #[validate(range(min = 0.1, max = 300.0, message = "มวลกล้ามเนื้อต้องอยู่ระหว่าง 0.1-300 กก."))]
    pub muscle_mass: f64,

    pub visceral_fat: Option<f64>,
}

/// Partial edit of a measurement; absent fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeasurementRequest {
    pub timestamp: Option<DateTime<FixedOffset>>,

    #[validate(range(min = 0.1, max = 500.0, message = "น้ำหนักต้องอยู่ระหว่าง 0.1-500 กก."))]
    pub weight: Option<f64>,

    pub body_fat_percentage: Option<f64>,

    #[validate(range(min = 0.1, max = 300.0, message = "มวลกล้ามเนื้อต้องอยู่ระหว่าง 0.1-300 กก."))]
    pub muscle_mass: Option<f64>,

    /// `None` keeps the stored value, `Some(None)` clears it
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    pub visceral_fat: Option<Option<f64>>,
}

/// Latest measurement interpreted against the current profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementInsights {
    pub measurement: Measurement,
    pub bmi_category: Option<BmiCategory>,
    pub body_fat_category: Option<BodyFatCategory>,
    pub ideal_weight_range: Option<WeightRange>,
    pub activity_level: ActivityLevel,
    pub tdee: Option<i32>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateMeasurementRequest {
        CreateMeasurementRequest {
            timestamp: None,
            weight: 70.0,
            body_fat_percentage: 20.0,
            muscle_mass: 30.0,
            visceral_fat: Some(8.0),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_non_positive_weight_fails() {
        let mut req = request();
        req.weight = 0.0;
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("weight"));
    }

    #[test]
    fn test_fat_bounds_are_left_to_metrics_validator() {
        let mut req = request();
        req.body_fat_percentage = 2.0;
        req.visceral_fat = Some(0.5);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_request_skips_absent_fields() {
        assert!(UpdateMeasurementRequest::default().validate().is_ok());
        let update = UpdateMeasurementRequest { muscle_mass: Some(-1.0), ..Default::default() };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let absent: UpdateMeasurementRequest = serde_json::from_str(r#"{"weight":71}"#).unwrap();
        assert_eq!(absent.visceral_fat, None);

        let cleared: UpdateMeasurementRequest = serde_json::from_str(r#"{"visceralFat":null}"#).unwrap();
        assert_eq!(cleared.visceral_fat, Some(None));

        let set: UpdateMeasurementRequest = serde_json::from_str(r#"{"visceralFat":9.5}"#).unwrap();
        assert_eq!(set.visceral_fat, Some(Some(9.5)));
    }

    #[test]
    fn test_timestamp_keeps_client_offset() {
        let json = r#"{"timestamp":"2024-03-01T06:30:00+07:00","weight":70,"bodyFatPercentage":20,"muscleMass":30}"#;
        let req: CreateMeasurementRequest = serde_json::from_str(json).unwrap();
        let ts = req.timestamp.unwrap();
        assert_eq!(ts.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(ts.with_timezone(&Utc).date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
