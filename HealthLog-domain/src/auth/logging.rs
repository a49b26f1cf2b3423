use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

/// Account and session events worth an audit line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEventType {
    Registration,
    Login,
    FailedLogin,
    Logout,
    TokenRefresh,
    TokenValidation,
}

impl std::fmt::Display for AuthEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AuthEventType::Registration => "REGISTRATION",
            AuthEventType::Login => "LOGIN",
            AuthEventType::FailedLogin => "FAILED_LOGIN",
            AuthEventType::Logout => "LOGOUT",
            AuthEventType::TokenRefresh => "TOKEN_REFRESH",
            AuthEventType::TokenValidation => "TOKEN_VALIDATION",
        };
        f.write_str(label)
    }
}

/// One audit record. Subjects are user ids or emails, never secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    pub event_type: AuthEventType,
    pub subject: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub details: Option<String>,
    /// Request path, when the event came from the middleware
    pub resource: Option<String>,
    pub duration_ms: Option<u64>,
    pub auth_method: Option<String>,
}

impl AuthEvent {
    pub fn new(event_type: AuthEventType, subject: Option<&str>, success: bool) -> Self {
        Self {
            event_type,
            subject: subject.map(String::from),
            timestamp: Utc::now(),
            success,
            details: None,
            resource: None,
            duration_ms: None,
            auth_method: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_auth_method(mut self, auth_method: impl Into<String>) -> Self {
        self.auth_method = Some(auth_method.into());
        self
    }
}

/// Emit an auth event through tracing; failures go out at warn level
pub fn log_auth_event(event: AuthEvent) {
    let subject = event.subject.as_deref().unwrap_or("anonymous");
    let details = event.details.as_deref().unwrap_or("");
    let resource = event.resource.as_deref().unwrap_or("-");
    let method = event.auth_method.as_deref().unwrap_or("-");

    if event.success {
        info!(
            event = %event.event_type,
            subject,
            resource,
            method,
            duration_ms = event.duration_ms,
            "AUTH-LOG [{}] [{}] [SUCCESS] {}",
            event.event_type,
            subject,
            details
        );
    } else {
        warn!(
            event = %event.event_type,
            subject,
            resource,
            method,
            duration_ms = event.duration_ms,
            "AUTH-LOG [{}] [{}] [FAILURE] {}",
            event.event_type,
            subject,
            details
        );
    }
}

pub fn log_registration(user_id: &str) {
    log_auth_event(
        AuthEvent::new(AuthEventType::Registration, Some(user_id), true).with_auth_method("password"),
    );
}

pub fn log_successful_login(user_id: &str) {
    log_auth_event(
        AuthEvent::new(AuthEventType::Login, Some(user_id), true).with_auth_method("password"),
    );
}

pub fn log_failed_login(email: &str, reason: &str) {
    log_auth_event(
        AuthEvent::new(AuthEventType::FailedLogin, Some(email), false)
            .with_details(reason)
            .with_auth_method("password"),
    );
}

pub fn log_token_refresh(user_id: &str, success: bool, details: Option<&str>) {
    let mut event = AuthEvent::new(AuthEventType::TokenRefresh, Some(user_id), success);
    if let Some(d) = details {
        event = event.with_details(d);
    }
    log_auth_event(event);
}

pub fn log_logout(user_id: &str) {
    log_auth_event(AuthEvent::new(AuthEventType::Logout, Some(user_id), true));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = AuthEvent::new(AuthEventType::TokenValidation, Some("user-1"), false)
            .with_details("Token has expired")
            .with_resource("/api/v1/measurements")
            .with_duration(3)
            .with_auth_method("jwt");

        assert_eq!(event.event_type, AuthEventType::TokenValidation);
        assert_eq!(event.subject.as_deref(), Some("user-1"));
        assert!(!event.success);
        assert_eq!(event.details.as_deref(), Some("Token has expired"));
        assert_eq!(event.resource.as_deref(), Some("/api/v1/measurements"));
        assert_eq!(event.duration_ms, Some(3));
        assert_eq!(event.auth_method.as_deref(), Some("jwt"));
    }

    #[test]
    fn test_event_type_display() {
        assert_eq!(AuthEventType::Registration.to_string(), "REGISTRATION");
        assert_eq!(AuthEventType::FailedLogin.to_string(), "FAILED_LOGIN");
        assert_eq!(AuthEventType::TokenRefresh.to_string(), "TOKEN_REFRESH");
    }

    #[test]
    fn test_logging_helpers_do_not_panic() {
        log_registration("user-1");
        log_successful_login("user-1");
        log_failed_login("ann@example.com", "bad password");
        log_token_refresh("user-1", true, None);
        log_logout("user-1");
    }
}
