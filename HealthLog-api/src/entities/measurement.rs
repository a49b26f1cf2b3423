use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use health_log_domain::entities::{
    CreateMeasurementRequest, Measurement, MeasurementInsights, UpdateMeasurementRequest,
};
use health_log_domain::metrics::{ActivityLevel, BmiCategory, BodyFatCategory, WeightRange};

/// Public representation of a measurement
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementResponse {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Calendar day the entry counts for, in the offset it was recorded with
    pub measured_on: NaiveDate,
    /// Kilograms
    pub weight: f64,
    pub body_fat_percentage: f64,
    /// Kilograms
    pub muscle_mass: f64,
    pub visceral_fat: Option<f64>,
    /// Absent when the profile was incomplete at write time
    pub bmi: Option<f64>,
    /// kcal/day; absent when the profile was incomplete at write time
    pub bmr: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Measurement> for MeasurementResponse {
    fn from(m: Measurement) -> Self {
        MeasurementResponse {
            id: m.id,
            timestamp: m.timestamp,
            measured_on: m.measured_on,
            weight: m.weight,
            body_fat_percentage: m.body_fat_percentage,
            muscle_mass: m.muscle_mass,
            visceral_fat: m.visceral_fat,
            bmi: m.bmi,
            bmr: m.bmr,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Request to record a measurement. BMI and BMR are never accepted from the client.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeasurementPayload {
    /// RFC 3339 with offset; defaults to now
    #[schema(value_type = Option<String>, example = "2024-03-01T07:30:00+07:00")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub weight: f64,
    pub body_fat_percentage: f64,
    pub muscle_mass: f64,
    pub visceral_fat: Option<f64>,
}

impl From<CreateMeasurementPayload> for CreateMeasurementRequest {
    fn from(p: CreateMeasurementPayload) -> Self {
        CreateMeasurementRequest {
            timestamp: p.timestamp,
            weight: p.weight,
            body_fat_percentage: p.body_fat_percentage,
            muscle_mass: p.muscle_mass,
            visceral_fat: p.visceral_fat,
        }
    }
}

/// Partial edit; absent fields keep their stored value
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeasurementPayload {
    #[schema(value_type = Option<String>)]
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub weight: Option<f64>,
    pub body_fat_percentage: Option<f64>,
    pub muscle_mass: Option<f64>,
    /// `null` removes a stored reading
    #[serde(default, skip_serializing_if = "Option::is_none", with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<f64>, nullable)]
    pub visceral_fat: Option<Option<f64>>,
}

impl From<UpdateMeasurementPayload> for UpdateMeasurementRequest {
    fn from(p: UpdateMeasurementPayload) -> Self {
        UpdateMeasurementRequest {
            timestamp: p.timestamp,
            weight: p.weight,
            body_fat_percentage: p.body_fat_percentage,
            muscle_mass: p.muscle_mass,
            visceral_fat: p.visceral_fat,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeasurementSavedResponse {
    pub success: bool,
    pub message: String,
    pub measurement: MeasurementResponse,
}

/// Latest measurement interpreted against the current profile
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightsResponse {
    pub measurement: MeasurementResponse,
    pub bmi_category: Option<BmiCategory>,
    /// Thai label for the BMI category
    pub bmi_label: Option<String>,
    pub body_fat_category: Option<BodyFatCategory>,
    pub body_fat_label: Option<String>,
    pub ideal_weight_range: Option<WeightRange>,
    pub activity_level: ActivityLevel,
    /// Total daily energy expenditure, kcal/day
    pub tdee: Option<i32>,
    pub generated_at: DateTime<Utc>,
}

impl From<MeasurementInsights> for InsightsResponse {
    fn from(insights: MeasurementInsights) -> Self {
        InsightsResponse {
            measurement: insights.measurement.into(),
            bmi_category: insights.bmi_category,
            bmi_label: insights.bmi_category.map(|c| c.label().to_string()),
            body_fat_category: insights.body_fat_category,
            body_fat_label: insights.body_fat_category.map(|c| c.label().to_string()),
            ideal_weight_range: insights.ideal_weight_range,
            activity_level: insights.activity_level,
            tdee: insights.tdee,
            generated_at: insights.generated_at,
        }
    }
}
