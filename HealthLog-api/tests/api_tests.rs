//! End-to-end tests over the default services. No database pool is
//! initialized, so every test shares the process-wide in-memory storage and
//! uses its own email address.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use health_log_api::api::create_application;

async fn app() -> Router {
    std::env::set_var("JWT_SECRET", "integration_test_secret");
    std::env::set_var("JWT_ISSUER", "health-log-api");
    create_application().await
}

async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response: Response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, json)
}

#[tokio::test]
async fn test_health_reports_in_memory_fallback() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["components"]["api"]["status"], "ok");
}

#[tokio::test]
async fn test_full_measurement_flow() {
    let app = app().await;
    let credentials = json!({ "email": "flow@example.com", "password": "long-enough-password" });

    let (status, _) = call(&app, Method::POST, "/auth/signup", None, Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, login) = call(&app, Method::POST, "/auth/login", None, Some(credentials)).await;
    assert_eq!(status, StatusCode::OK);
    let token = login["accessToken"].as_str().unwrap().to_string();

    let profile = json!({ "gender": "male", "dateOfBirth": "1990-01-01", "height": 175 });
    let (status, _) = call(&app, Method::PUT, "/api/v1/profile", Some(&token), Some(profile)).await;
    assert_eq!(status, StatusCode::OK);

    let measurement = json!({
        "timestamp": "2024-06-01T07:00:00+07:00",
        "weight": 70,
        "bodyFatPercentage": 18,
        "muscleMass": 33,
        "visceralFat": 6
    });
    let (status, created) = call(&app, Method::POST, "/api/v1/measurements", Some(&token), Some(measurement.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["measurement"]["bmi"], 22.9);
    assert_eq!(created["measurement"]["bmr"], 1629);

    let (status, _) = call(&app, Method::POST, "/api/v1/measurements", Some(&token), Some(measurement)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, page) = call(&app, Method::GET, "/api/v1/measurements", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalCount"], 1);
    assert_eq!(page["limit"], 20);

    // A profile change does not rewrite stored metrics
    let (status, _) = call(&app, Method::PUT, "/api/v1/profile", Some(&token), Some(json!({ "height": 180 }))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, latest) = call(&app, Method::GET, "/api/v1/measurements/latest", Some(&token), None).await;
    assert_eq!(latest["bmi"], 22.9);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app().await;

    for uri in ["/api/v1/profile", "/api/v1/measurements", "/api/v1/measurements/latest", "/auth/info"] {
        let (status, body) = call(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["message"], "ไม่ได้เข้าสู่ระบบ");
    }
}

#[tokio::test]
async fn test_security_headers_are_set() {
    let app = app().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}
