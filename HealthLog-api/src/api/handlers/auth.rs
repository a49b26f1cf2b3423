use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{error, info, instrument};

use health_log_domain::auth::issue_token_pair;

use crate::api::handlers::error::{json_body, ErrorResponse};
use crate::api::routes::AppState;
use crate::entities::auth::{LoginPayload, LoginResponse, SignUpPayload, SignUpResponse};

pub const SIGNUP_SUCCESS: &str = "สมัครสมาชิกสำเร็จ";

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignUpPayload,
    responses(
        (status = 201, description = "Account created", body = SignUpResponse),
        (status = 400, description = "Missing email or password, or password too short", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignUpPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let payload = json_body(payload)?;
    let profile = state.accounts.sign_up(payload.into()).await?;
    info!("Account created: {}", profile.id);

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            message: SIGNUP_SUCCESS.to_string(),
            user: profile.into(),
        }),
    ))
}

/// Exchange email and password for a token pair
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<Json<LoginResponse>, ErrorResponse> {
    let payload = json_body(payload)?;
    let profile = state.accounts.authenticate(payload.into()).await?;

    let tokens = issue_token_pair(&profile.id.to_string(), &profile.email).map_err(|e| {
        error!("Failed to issue tokens: {}", e);
        ErrorResponse::internal("Failed to generate token")
    })?;

    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: tokens.token_type,
        expires_in: tokens.expires_in,
        user: profile.into(),
    }))
}
