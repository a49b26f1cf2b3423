use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use health_log_domain::entities::{Credentials, SignUpRequest};

use crate::entities::profile::ProfileResponse;

/// Registration request payload. Missing fields are reported by the account
/// service with its own messages, so both default to empty.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignUpPayload {
    #[serde(default)]
    pub email: String,

    /// At least 8 characters
    #[serde(default)]
    pub password: String,

    pub name: Option<String>,
}

impl From<SignUpPayload> for SignUpRequest {
    fn from(payload: SignUpPayload) -> Self {
        SignUpRequest {
            email: payload.email,
            password: payload.password,
            name: payload.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignUpResponse {
    pub message: String,
    pub user: ProfileResponse,
}

/// Login request payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginPayload {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,
}

impl From<LoginPayload> for Credentials {
    fn from(payload: LoginPayload) -> Self {
        Credentials {
            email: payload.email,
            password: payload.password,
        }
    }
}

/// Login response payload
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// JWT access token
    pub access_token: String,

    /// JWT refresh token, accepted only by `/auth/refresh`
    pub refresh_token: String,

    /// Always `Bearer`
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    pub user: ProfileResponse,
}
