use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics::{Demographics, Gender, MetricsError};

/// An account's public profile with its demographic fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    /// Height in centimeters
    pub height: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Demographics for derived calculations, or the first missing field
    pub fn demographics(&self) -> Result<Demographics, MetricsError> {
        Demographics::from_parts(self.gender, self.date_of_birth, self.height)
    }

    /// Whether gender, date of birth and height are all set
    pub fn is_complete(&self) -> bool {
        self.demographics().is_ok()
    }
}

/// Partial profile update. Values arrive as raw strings so each can be
/// rejected with its own message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    /// `YYYY-MM-DD`
    pub date_of_birth: Option<String>,
    pub height: Option<f64>,
}
