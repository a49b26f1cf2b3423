use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use tracing::{info, instrument};
use validator::Validate;

use health_log_domain::auth::UserInfo;

use crate::api::handlers::error::{json_body, ErrorResponse};
use crate::api::routes::AppState;
use crate::entities::profile::{ProfileResponse, ProfileUpdatedResponse, UpdateProfilePayload};

pub const PROFILE_UPDATED: &str = "อัปเดตโปรไฟล์สำเร็จ";

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    ),
    security(("jwt_auth" = [])),
    tag = "profile"
)]
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<ProfileResponse>, ErrorResponse> {
    let profile = state.profiles.get_profile(&user.user_id).await?;
    Ok(Json(profile.into()))
}

/// Merge the supplied fields into the profile. Existing measurements keep
/// the BMI and BMR they were saved with.
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdatedResponse),
        (status = 400, description = "Invalid gender, date of birth or height", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("jwt_auth" = [])),
    tag = "profile"
)]
#[instrument(skip(state, user, payload), fields(user_id = %user.user_id))]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    payload: Result<Json<UpdateProfilePayload>, JsonRejection>,
) -> Result<Json<ProfileUpdatedResponse>, ErrorResponse> {
    let payload = json_body(payload)?;
    payload.validate()?;

    let profile = state.profiles.update_profile(&user.user_id, payload.into()).await?;
    info!("Profile updated");

    Ok(Json(ProfileUpdatedResponse {
        message: PROFILE_UPDATED.to_string(),
        user: profile.into(),
    }))
}
