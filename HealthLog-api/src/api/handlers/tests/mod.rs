mod measurements_test;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use health_log_domain::testing::{create_mock_services, MockHealthService, MockServices};

use crate::api::routes::build_router;

pub(super) fn init_jwt_env() {
    std::env::set_var("JWT_SECRET", "test_secret_key_for_testing_only");
    std::env::set_var("JWT_ISSUER", "test-issuer");
}

pub(super) fn app_with(services: MockServices) -> Router {
    init_jwt_env();
    build_router(services.into(), Arc::new(MockHealthService::healthy()))
}

pub(super) fn test_app() -> Router {
    app_with(create_mock_services())
}

pub(super) async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub(super) async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
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

    app.clone().oneshot(request).await.unwrap()
}

/// Sign up and log in, returning the login body
pub(super) async fn sign_in(app: &Router, email: &str) -> Value {
    let credentials = json!({ "email": email, "password": "correct-horse" });

    let response = send(app, Method::POST, "/auth/signup", None, Some(credentials.clone())).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(app, Method::POST, "/auth/login", None, Some(credentials)).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

pub(super) async fn access_token(app: &Router, email: &str) -> String {
    sign_in(app, email).await["accessToken"].as_str().unwrap().to_string()
}
