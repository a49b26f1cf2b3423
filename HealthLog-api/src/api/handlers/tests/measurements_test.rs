use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::{json, Value};

use health_log_domain::services::measurement::{DUPLICATE_DAY, MEASUREMENT_NOT_FOUND, SAVE_FAILED};
use health_log_domain::testing::create_failing_mock_services;

use super::{access_token, app_with, body_json, send, test_app};

fn entry(timestamp: &str, weight: f64) -> Value {
    json!({
        "timestamp": timestamp,
        "weight": weight,
        "bodyFatPercentage": 18.5,
        "muscleMass": 32.0,
        "visceralFat": 7.0
    })
}

async fn complete_profile(app: &Router, token: &str) {
    let profile = json!({ "gender": "male", "dateOfBirth": "1990-01-01", "height": 175 });
    let response = send(app, Method::PUT, "/api/v1/profile", Some(token), Some(profile)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

async fn create(app: &Router, token: &str, body: Value) -> Value {
    let response = send(app, Method::POST, "/api/v1/measurements", Some(token), Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["measurement"].clone()
}

#[tokio::test]
async fn test_create_derives_bmi_and_bmr() {
    let app = test_app();
    let token = access_token(&app, "hal@example.com").await;
    complete_profile(&app, &token).await;

    let response = send(
        &app,
        Method::POST,
        "/api/v1/measurements",
        Some(&token),
        Some(entry("2024-06-01T07:30:00+07:00", 70.0)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "บันทึกข้อมูลเรียบร้อยแล้ว");
    assert_eq!(body["measurement"]["bmi"], 22.9);
    assert_eq!(body["measurement"]["bmr"], 1629);
    assert_eq!(body["measurement"]["measuredOn"], "2024-06-01");
}

#[tokio::test]
async fn test_incomplete_profile_leaves_metrics_absent() {
    let app = test_app();
    let token = access_token(&app, "ida@example.com").await;

    let measurement = create(&app, &token, entry("2024-06-01T08:00:00Z", 60.0)).await;
    assert!(measurement["bmi"].is_null());
    assert!(measurement["bmr"].is_null());
}

#[tokio::test]
async fn test_second_entry_on_same_day_conflicts() {
    let app = test_app();
    let token = access_token(&app, "jon@example.com").await;

    create(&app, &token, entry("2024-06-01T06:00:00+07:00", 70.0)).await;

    let response = send(
        &app,
        Method::POST,
        "/api/v1/measurements",
        Some(&token),
        Some(entry("2024-06-01T21:00:00+07:00", 70.4)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["message"], DUPLICATE_DAY);
}

#[tokio::test]
async fn test_invalid_input_lists_every_message() {
    let app = test_app();
    let token = access_token(&app, "kim@example.com").await;

    let body = json!({ "weight": 0, "bodyFatPercentage": 140, "muscleMass": 30 });
    let response = send(&app, Method::POST, "/api/v1/measurements", Some(&token), Some(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"].as_array().unwrap().len(), 2);

    // Missing required fields never reach the service
    let response = send(&app, Method::POST, "/api/v1/measurements", Some(&token), Some(json!({ "weight": 70 }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_low_fat_readings_report_plausibility_messages() {
    let app = test_app();
    let token = access_token(&app, "kit@example.com").await;

    let body = json!({ "weight": 70, "bodyFatPercentage": 2.0, "muscleMass": 30, "visceralFat": 0.5 });
    let response = send(&app, Method::POST, "/api/v1/measurements", Some(&token), Some(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(
        body["details"],
        json!(["เปอร์เซ็นต์ไขมันอยู่นอกช่วงที่เป็นไปได้", "ไขมันในช่องท้องอยู่นอกช่วงที่เป็นไปได้"])
    );
}

#[tokio::test]
async fn test_huge_offset_is_rejected() {
    let app = test_app();
    let token = access_token(&app, "kai@example.com").await;
    create(&app, &token, entry("2024-06-01T08:00:00Z", 70.0)).await;

    let response = send(
        &app,
        Method::GET,
        "/api/v1/measurements?offset=18446744073709551615",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let uri = format!("/api/v1/measurements?offset={}", i64::MAX);
    let response = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["data"].as_array().unwrap().len(), 0);
    assert!(page.get("next").is_none());
}

#[tokio::test]
async fn test_history_is_paginated_and_filtered() {
    let app = test_app();
    let token = access_token(&app, "lea@example.com").await;

    for day in 1..=5 {
        create(&app, &token, entry(&format!("2024-06-0{}T08:00:00Z", day), 70.0 + day as f64)).await;
    }

    let response = send(&app, Method::GET, "/api/v1/measurements?limit=2", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["totalCount"], 5);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["data"][0]["measuredOn"], "2024-06-05");
    assert_eq!(page["next"], "/api/v1/measurements?limit=2&offset=2");
    assert!(page.get("previous").is_none());

    let response = send(
        &app,
        Method::GET,
        "/api/v1/measurements?startDate=2024-06-02&endDate=2024-06-04&sort=asc",
        Some(&token),
        None,
    )
    .await;
    let page = body_json(response).await;
    assert_eq!(page["totalCount"], 3);
    assert_eq!(page["data"][0]["measuredOn"], "2024-06-02");
    assert_eq!(page["data"][2]["measuredOn"], "2024-06-04");

    let response = send(&app, Method::GET, "/api/v1/measurements?startDate=yesterday", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, Method::GET, "/api/v1/measurements?sort=sideways", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_update_delete_cycle() {
    let app = test_app();
    let token = access_token(&app, "max@example.com").await;
    complete_profile(&app, &token).await;

    let created = create(&app, &token, entry("2024-06-01T08:00:00Z", 70.0)).await;
    let uri = format!("/api/v1/measurements/{}", created["id"].as_str().unwrap());

    let response = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "weight": 80.0 }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["measurement"]["bmi"], 26.1);
    assert_eq!(updated["measurement"]["bmr"], 1729);

    let response = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "visceralFat": null }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert!(updated["measurement"]["visceralFat"].is_null());
    assert_eq!(updated["measurement"]["weight"], 80.0);

    let response = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], MEASUREMENT_NOT_FOUND);
}

#[tokio::test]
async fn test_entries_are_private_to_their_owner() {
    let app = test_app();
    let owner = access_token(&app, "ned@example.com").await;
    let other = access_token(&app, "oli@example.com").await;

    let created = create(&app, &owner, entry("2024-06-01T08:00:00Z", 70.0)).await;
    let uri = format!("/api/v1/measurements/{}", created["id"].as_str().unwrap());

    let response = send(&app, Method::GET, &uri, Some(&other), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, Method::DELETE, &uri, Some(&other), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, Method::GET, "/api/v1/measurements/not-a-uuid", Some(&owner), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_latest_and_insights() {
    let app = test_app();
    let token = access_token(&app, "pam@example.com").await;

    let response = send(&app, Method::GET, "/api/v1/measurements/latest", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    complete_profile(&app, &token).await;
    create(&app, &token, entry("2024-06-01T08:00:00Z", 68.0)).await;
    create(&app, &token, entry("2024-06-02T08:00:00Z", 70.0)).await;

    let response = send(&app, Method::GET, "/api/v1/measurements/latest", Some(&token), None).await;
    assert_eq!(body_json(response).await["measuredOn"], "2024-06-02");

    let response = send(
        &app,
        Method::GET,
        "/api/v1/measurements/insights?activityLevel=moderate",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let insights = body_json(response).await;
    assert_eq!(insights["bmiCategory"], "normal");
    assert_eq!(insights["activityLevel"], "moderate");
    assert_eq!(insights["idealWeightRange"]["min"], 56.7);
    assert_eq!(insights["idealWeightRange"]["max"], 76.3);
    assert!(insights["tdee"].is_i64());

    let response = send(
        &app,
        Method::GET,
        "/api/v1/measurements/insights?activityLevel=couch",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_storage_failure_is_reported_generically() {
    let app = app_with(create_failing_mock_services());
    let token = access_token(&app, "quin@example.com").await;

    let response = send(
        &app,
        Method::POST,
        "/api/v1/measurements",
        Some(&token),
        Some(entry("2024-06-01T08:00:00Z", 70.0)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["message"], SAVE_FAILED);
}
