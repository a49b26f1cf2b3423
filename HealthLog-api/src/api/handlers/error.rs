use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use health_log_domain::auth::UNAUTHENTICATED_MESSAGE;
use health_log_domain::services::account::INVALID_CREDENTIALS;
use health_log_domain::services::measurement::SAVE_FAILED;
use health_log_domain::services::{AccountServiceError, ProfileServiceError, ServiceError};

const INTERNAL_MESSAGE: &str = "เกิดข้อผิดพลาด กรุณาลองใหม่อีกครั้ง";

/// Error response format for API
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable identifier
    pub error: String,

    /// Human-readable message
    pub message: String,

    /// Every failed rule when more than one applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,

    #[serde(skip)]
    status: StatusCode,
}

impl ErrorResponse {
    fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
            status,
        }
    }

    pub fn validation(messages: Vec<String>) -> Self {
        let message = messages.first().cloned().unwrap_or_default();
        Self {
            details: Some(messages),
            ..Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<ValidationErrors> for ErrorResponse {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string()))
            .collect();
        messages.sort();
        Self::validation(messages)
    }
}

impl From<ServiceError> for ErrorResponse {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::ValidationError(messages) => Self::validation(messages),
            ServiceError::NotFound(msg) => Self::not_found(msg),
            ServiceError::Conflict(msg) => Self::conflict(msg),
            ServiceError::RepositoryError(msg) => {
                error!("Measurement storage failure: {}", msg);
                Self::internal(SAVE_FAILED)
            }
        }
    }
}

impl From<ProfileServiceError> for ErrorResponse {
    fn from(err: ProfileServiceError) -> Self {
        match err {
            ProfileServiceError::ValidationError(msg) => Self::validation(vec![msg]),
            ProfileServiceError::NotFound(msg) => Self::not_found(msg),
            ProfileServiceError::RepositoryError(msg) | ProfileServiceError::Internal(msg) => {
                error!("Profile failure: {}", msg);
                Self::internal(INTERNAL_MESSAGE)
            }
        }
    }
}

impl From<AccountServiceError> for ErrorResponse {
    fn from(err: AccountServiceError) -> Self {
        match err {
            AccountServiceError::ValidationError(msg) => Self::validation(vec![msg]),
            AccountServiceError::Conflict(msg) => Self::conflict(msg),
            AccountServiceError::InvalidCredentials => Self::unauthorized(INVALID_CREDENTIALS),
            AccountServiceError::RepositoryError(msg) | AccountServiceError::Internal(msg) => {
                error!("Account failure: {}", msg);
                Self::internal(INTERNAL_MESSAGE)
            }
        }
    }
}

/// Unwrap a JSON body, reporting malformed input in the API's error format
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ErrorResponse> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ErrorResponse::bad_request(rejection.body_text()))
}

/// 401 for a protected route reached without a usable identity
pub fn unauthenticated() -> ErrorResponse {
    ErrorResponse::unauthorized(UNAUTHENTICATED_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_log_domain::services::measurement::DUPLICATE_DAY;

    #[test]
    fn test_service_errors_map_to_status_codes() {
        let cases = vec![
            (ErrorResponse::from(ServiceError::ValidationError(vec!["a".into(), "b".into()])), StatusCode::BAD_REQUEST),
            (ErrorResponse::from(ServiceError::NotFound("x".into())), StatusCode::NOT_FOUND),
            (ErrorResponse::from(ServiceError::Conflict(DUPLICATE_DAY.into())), StatusCode::CONFLICT),
            (ErrorResponse::from(ServiceError::RepositoryError("disk".into())), StatusCode::INTERNAL_SERVER_ERROR),
            (ErrorResponse::from(AccountServiceError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (ErrorResponse::from(ProfileServiceError::NotFound("x".into())), StatusCode::NOT_FOUND),
        ];

        for (response, expected) in cases {
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_validation_keeps_every_message() {
        let response = ErrorResponse::from(ServiceError::ValidationError(vec!["a".into(), "b".into()]));
        assert_eq!(response.message, "a");
        assert_eq!(response.details, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_response_body_omits_status_and_empty_details() {
        let response = ErrorResponse::not_found("ไม่พบข้อมูลการวัด").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = tokio_test::block_on(axum::body::to_bytes(response.into_body(), usize::MAX)).unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "not_found", "message": "ไม่พบข้อมูลการวัด" }));
    }

    #[test]
    fn test_storage_failure_hides_cause() {
        let response = ErrorResponse::from(ServiceError::RepositoryError("sqlite: disk I/O".into()));
        assert_eq!(response.message, SAVE_FAILED);
        assert!(response.details.is_none());
    }
}
