//! Authentication for the HealthLog API
//!
//! Stateless JWT access/refresh tokens, Argon2 password hashing and the axum
//! middleware that guards everything under `/api/v1`.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::auth::logging::{log_auth_event, log_logout, log_token_refresh, AuthEvent, AuthEventType};
use crate::auth::token::{SecurityError, TokenType};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

pub mod token;

pub mod token_blacklist;

pub mod password;

pub mod logging;

/// Message returned with every 401
pub const UNAUTHENTICATED_MESSAGE: &str = "ไม่ได้เข้าสู่ระบบ";

/// JWT claims issued by this service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub email: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id, the revocation key
    pub jti: String,
    /// Access or refresh
    pub typ: TokenType,
}

/// The authenticated caller, attached to request extensions by [`auth_middleware`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: String,
    pub email: Option<String>,
    /// How the caller authenticated ("jwt")
    pub auth_source: String,
}

impl From<&Claims> for UserInfo {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            email: Some(claims.email.clone()).filter(|e| !e.is_empty()),
            auth_source: "jwt".to_string(),
        }
    }
}

/// Freshly issued access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Issue an access/refresh pair for a user
pub fn issue_token_pair(user_id: &str, email: &str) -> Result<TokenPair, SecurityError> {
    Ok(TokenPair {
        access_token: token::generate_token(user_id, email, TokenType::Access)?,
        refresh_token: token::generate_token(user_id, email, TokenType::Refresh)?,
        token_type: "Bearer".to_string(),
        expires_in: TokenType::Access.expiration().num_seconds(),
    })
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or("Authorization header does not contain Bearer token")
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": UNAUTHENTICATED_MESSAGE
        })),
    ).into_response()
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Authentication middleware for protected routes.
///
/// Accepts only access tokens. On success inserts [`UserInfo`] and [`Claims`]
/// into the request extensions.
pub async fn auth_middleware(mut req: Request, next: Next) -> Response {
    let request_path = req.uri().path().to_string();
    let start_time = Instant::now();

    let token = match bearer_token(req.headers()) {
        Ok(token) => token.to_string(),
        Err(reason) => {
            debug!("{}", reason);
            log_auth_event(
                AuthEvent::new(AuthEventType::TokenValidation, None, false)
                    .with_details(reason)
                    .with_resource(request_path)
                    .with_duration(elapsed_ms(start_time))
                    .with_auth_method("jwt"),
            );
            return unauthorized();
        }
    };

    match token::validate_token(&token, TokenType::Access) {
        Ok(claims) => {
            debug!("Token validated for user: {}", claims.sub);
            log_auth_event(
                AuthEvent::new(AuthEventType::TokenValidation, Some(&claims.sub), true)
                    .with_resource(request_path)
                    .with_duration(elapsed_ms(start_time))
                    .with_auth_method("jwt"),
            );

            req.extensions_mut().insert(UserInfo::from(&claims));
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            warn!("Rejected token: {}", e);
            log_auth_event(
                AuthEvent::new(AuthEventType::TokenValidation, None, false)
                    .with_details(e.to_string())
                    .with_resource(request_path)
                    .with_duration(elapsed_ms(start_time))
                    .with_auth_method("jwt"),
            );
            unauthorized()
        }
    }
}

/// CORS origins from `CORS_ALLOWED_ORIGINS` (comma separated). Unset or `*` allows any.
fn cors_layer() -> tower_http::cors::CorsLayer {
    use axum::http::{HeaderValue, Method};
    use tower_http::cors::{AllowOrigin, Any, CorsLayer};

    let origins: Vec<HeaderValue> = env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty() && *o != "*")
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Apply CORS and security headers to the whole application
pub fn configure_auth(app: axum::Router) -> axum::Router {
    use axum::http::{HeaderName, HeaderValue};
    use tower_http::set_header::SetResponseHeaderLayer;

    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=63072000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
        ));

    app.layer(cors_layer()).layer(security_headers)
}

/// Current user info
#[cfg_attr(feature = "with-api", utoipa::path(
    get,
    path = "/auth/info",
    responses(
        (status = 200, description = "Authenticated user", body = UserInfo),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Authentication",
    security(
        ("jwt_auth" = [])
    )
))]
pub async fn auth_info(Extension(user_info): Extension<UserInfo>) -> Json<UserInfo> {
    Json(user_info)
}

/// Exchange a refresh token for a new pair. The presented refresh token is revoked.
#[cfg_attr(feature = "with-api", utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Token refreshed successfully", body = TokenPair),
        (status = 401, description = "Invalid refresh token")
    ),
    tag = "Authentication",
    security(
        ("jwt_auth" = [])
    )
))]
pub async fn refresh_token(headers: HeaderMap) -> Result<Json<TokenPair>, (StatusCode, Json<Value>)> {
    let start_time = Instant::now();
    let rejected = || (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "invalid_token", "message": UNAUTHENTICATED_MESSAGE })),
    );

    let presented = match bearer_token(&headers) {
        Ok(token) => token,
        Err(reason) => {
            log_auth_event(
                AuthEvent::new(AuthEventType::TokenRefresh, None, false)
                    .with_details(reason)
                    .with_duration(elapsed_ms(start_time))
                    .with_auth_method("refresh_token"),
            );
            return Err(rejected());
        }
    };

    let claims = match token::validate_token(presented, TokenType::Refresh) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Invalid refresh token: {}", e);
            log_auth_event(
                AuthEvent::new(AuthEventType::TokenRefresh, None, false)
                    .with_details(e.to_string())
                    .with_duration(elapsed_ms(start_time))
                    .with_auth_method("refresh_token"),
            );
            return Err(rejected());
        }
    };

    match issue_token_pair(&claims.sub, &claims.email) {
        Ok(pair) => {
            token::revoke_token(&claims);
            log_token_refresh(&claims.sub, true, None);
            Ok(Json(pair))
        }
        Err(e) => {
            error!("Failed to issue tokens on refresh: {}", e);
            log_token_refresh(&claims.sub, false, Some(&e.to_string()));
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "server_error", "message": "Failed to generate token" })),
            ))
        }
    }
}

/// Revoke the access token used for this request
#[cfg_attr(feature = "with-api", utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out successfully"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Authentication",
    security(
        ("jwt_auth" = [])
    )
))]
pub async fn logout(Extension(claims): Extension<Claims>) -> Json<Value> {
    token::revoke_token(&claims);
    log_logout(&claims.sub);

    Json(json!({
        "message": "ออกจากระบบสำเร็จ",
        "status": "success"
    }))
}
