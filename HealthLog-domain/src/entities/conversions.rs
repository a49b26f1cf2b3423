use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

use health_log_data::models::measurement as data_measurement;
use health_log_data::models::user as data_user;

use crate::entities::measurement::Measurement;
use crate::entities::profile::UserProfile;

/// Conversion functions between domain entities and data models
/// These functions follow the pattern convert_to_[target_layer]_[model_name]

/// Helper function to safely parse a string ID to UUID
pub fn parse_string_to_uuid(id: &str) -> Result<Uuid, String> {
    Uuid::parse_str(id).map_err(|_| format!("Invalid UUID format: {}", id))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| format!("Invalid timestamp: {}", value))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| format!("Invalid date: {}", value))
}

/// Storage encoding for an instant. Fixed width UTC, so string order is time order.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Storage encoding for a calendar day
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Convert from data model to domain entity for a measurement
pub fn convert_to_domain_measurement(data: data_measurement::Measurement) -> Result<Measurement, String> {
    Ok(Measurement {
        id: parse_string_to_uuid(&data.id)?,
        user_id: parse_string_to_uuid(&data.user_id)?,
        timestamp: parse_timestamp(&data.timestamp)?,
        measured_on: parse_date(&data.measured_on)?,
        weight: data.weight,
        body_fat_percentage: data.body_fat_percentage,
        muscle_mass: data.muscle_mass,
        visceral_fat: data.visceral_fat,
        bmi: data.bmi,
        bmr: data.bmr,
        created_at: parse_timestamp(&data.created_at)?,
        updated_at: parse_timestamp(&data.updated_at)?,
    })
}

/// Convert from domain entity to data model for a measurement
pub fn convert_to_data_measurement(domain: &Measurement) -> data_measurement::Measurement {
    data_measurement::Measurement {
        id: domain.id.to_string(),
        user_id: domain.user_id.to_string(),
        timestamp: format_timestamp(domain.timestamp),
        measured_on: format_date(domain.measured_on),
        weight: domain.weight,
        body_fat_percentage: domain.body_fat_percentage,
        muscle_mass: domain.muscle_mass,
        visceral_fat: domain.visceral_fat,
        bmi: domain.bmi,
        bmr: domain.bmr,
        created_at: domain.created_at.to_rfc3339(),
        updated_at: domain.updated_at.to_rfc3339(),
    }
}

/// Convert from data model to domain entity for a profile. Unknown stored
/// gender values are treated as unset.
pub fn convert_to_domain_profile(data: data_user::User) -> Result<UserProfile, String> {
    Ok(UserProfile {
        id: parse_string_to_uuid(&data.id)?,
        email: data.email,
        name: data.name,
        gender: data.gender.as_deref().and_then(|g| g.parse().ok()),
        date_of_birth: data.date_of_birth.as_deref().map(parse_date).transpose()?,
        height: data.height,
        created_at: parse_timestamp(&data.created_at)?,
        updated_at: parse_timestamp(&data.updated_at)?,
    })
}

/// Convert from domain entity to the profile columns of the data model
pub fn convert_to_data_profile(domain: &UserProfile) -> data_user::ProfileUpdate {
    data_user::ProfileUpdate {
        name: domain.name.clone(),
        gender: domain.gender.map(|g| g.as_str().to_string()),
        date_of_birth: domain.date_of_birth.map(format_date),
        height: domain.height,
    }
}
