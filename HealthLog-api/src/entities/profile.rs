use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use health_log_domain::entities::{Gender, UpdateProfileRequest, UserProfile};

/// Public view of an account's profile
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    /// Height in centimeters
    pub height: Option<f64>,
    /// Whether gender, date of birth and height are all set, so BMR can be derived
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        let profile_complete = profile.is_complete();
        ProfileResponse {
            id: profile.id,
            email: profile.email,
            name: profile.name,
            gender: profile.gender,
            date_of_birth: profile.date_of_birth,
            height: profile.height,
            profile_complete,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// Profile update payload. Absent fields are left unchanged; an empty name clears it.
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    #[validate(length(max = 100, message = "ชื่อต้องไม่เกิน 100 ตัวอักษร"))]
    pub name: Option<String>,

    /// `male`, `female` or `other`
    pub gender: Option<String>,

    /// `YYYY-MM-DD`
    pub date_of_birth: Option<String>,

    /// Height in centimeters, 0-300
    pub height: Option<f64>,
}

impl From<UpdateProfilePayload> for UpdateProfileRequest {
    fn from(payload: UpdateProfilePayload) -> Self {
        UpdateProfileRequest {
            name: payload.name,
            gender: payload.gender,
            date_of_birth: payload.date_of_birth,
            height: payload.height,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileUpdatedResponse {
    pub message: String,
    pub user: ProfileResponse,
}
