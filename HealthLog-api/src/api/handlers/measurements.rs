use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::IntoParams;

use health_log_domain::auth::UserInfo;
use health_log_domain::metrics::ActivityLevel;

use crate::api::handlers::error::{json_body, ErrorResponse};
use crate::api::routes::AppState;
use crate::entities::common::{MeasurementPage, MessageResponse, PaginatedResponse};
use crate::entities::measurement::{
    CreateMeasurementPayload, InsightsResponse, MeasurementResponse, MeasurementSavedResponse,
    UpdateMeasurementPayload,
};

pub const SAVED: &str = "บันทึกข้อมูลเรียบร้อยแล้ว";
pub const UPDATED: &str = "แก้ไขข้อมูลเรียบร้อยแล้ว";
pub const DELETED: &str = "ลบข้อมูลเรียบร้อยแล้ว";

const BASE_URL: &str = "/api/v1/measurements";
const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;
/// SQLite stores `OFFSET` as a signed 64-bit integer
const MAX_OFFSET: usize = i64::MAX as usize;

/// Query parameters for the measurement history
#[derive(Debug, Default, Deserialize, Clone, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HistoryQueryParams {
    /// RFC 3339 instant or `YYYY-MM-DD` (start of that day, UTC)
    pub start_date: Option<String>,

    /// RFC 3339 instant or `YYYY-MM-DD` (end of that day, UTC), inclusive
    pub end_date: Option<String>,

    /// Page size (default: 20, max: 100)
    pub limit: Option<usize>,

    /// Pagination offset (default: 0)
    pub offset: Option<usize>,

    /// `asc` or `desc` (default: desc, newest first)
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct InsightsQueryParams {
    /// `sedentary`, `light`, `moderate`, `active` or `very-active` (default: sedentary)
    pub activity_level: Option<String>,
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

/// Accept a full timestamp or a bare calendar day
fn parse_date_bound(value: &str, bound: Bound) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    let day = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let time = match bound {
        Bound::Start => NaiveTime::MIN,
        Bound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?,
    };
    Some(day.and_time(time).and_utc())
}

fn optional_bound(value: Option<&str>, bound: Bound, name: &str) -> Result<Option<DateTime<Utc>>, ErrorResponse> {
    match value {
        None => Ok(None),
        Some(raw) => parse_date_bound(raw, bound).map(Some).ok_or_else(|| {
            ErrorResponse::bad_request(format!(
                "Invalid {} format. Use YYYY-MM-DD or RFC 3339 (e.g. 2024-03-01T08:30:00+07:00)",
                name
            ))
        }),
    }
}

fn page_url(params: &HistoryQueryParams, limit: usize, offset: usize) -> String {
    let mut query_parts = Vec::new();

    if let Some(start) = &params.start_date {
        query_parts.push(format!("startDate={}", urlencoding::encode(start)));
    }
    if let Some(end) = &params.end_date {
        query_parts.push(format!("endDate={}", urlencoding::encode(end)));
    }
    if let Some(sort) = &params.sort {
        query_parts.push(format!("sort={}", urlencoding::encode(sort)));
    }
    query_parts.push(format!("limit={}", limit));
    query_parts.push(format!("offset={}", offset));

    format!("{}?{}", BASE_URL, query_parts.join("&"))
}

/// Links to the neighbouring pages, preserving the caller's filters
fn generate_pagination_links(
    total_count: usize,
    limit: usize,
    offset: usize,
    params: &HistoryQueryParams,
) -> (Option<String>, Option<String>) {
    let next = offset
        .checked_add(limit)
        .filter(|end| *end < total_count)
        .map(|end| page_url(params, limit, end));
    let previous = (offset > 0).then(|| page_url(params, limit, offset.saturating_sub(limit)));
    (next, previous)
}

/// Record a measurement
#[utoipa::path(
    post,
    path = "/api/v1/measurements",
    request_body = CreateMeasurementPayload,
    responses(
        (status = 201, description = "Measurement saved", body = MeasurementSavedResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 409, description = "An entry already exists for that day", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    security(("jwt_auth" = [])),
    tag = "measurements"
)]
#[instrument(skip(state, user, payload), fields(user_id = %user.user_id))]
pub async fn create_measurement(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    payload: Result<Json<CreateMeasurementPayload>, JsonRejection>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let payload = json_body(payload)?;
    let measurement = state.measurements.create_measurement(&user.user_id, payload.into()).await?;
    info!("Measurement {} saved for {}", measurement.id, measurement.measured_on);

    Ok((
        StatusCode::CREATED,
        Json(MeasurementSavedResponse {
            success: true,
            message: SAVED.to_string(),
            measurement: measurement.into(),
        }),
    ))
}

/// Paginated measurement history
#[utoipa::path(
    get,
    path = "/api/v1/measurements",
    params(HistoryQueryParams),
    responses(
        (status = 200, description = "Measurement history", body = MeasurementPage),
        (status = 400, description = "Invalid date filter", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("jwt_auth" = [])),
    tag = "measurements"
)]
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn list_measurements(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Query(params): Query<HistoryQueryParams>,
) -> Result<Json<PaginatedResponse<MeasurementResponse>>, ErrorResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);
    if offset > MAX_OFFSET {
        return Err(ErrorResponse::bad_request(format!("offset must not exceed {}", MAX_OFFSET)));
    }

    let sort_desc = match params.sort.as_deref() {
        None | Some("desc") => true,
        Some("asc") => false,
        Some(_) => return Err(ErrorResponse::bad_request("sort must be asc or desc")),
    };

    let start = optional_bound(params.start_date.as_deref(), Bound::Start, "startDate")?;
    let end = optional_bound(params.end_date.as_deref(), Bound::End, "endDate")?;

    let (items, total_count) = state
        .measurements
        .list_measurements(&user.user_id, start, end, Some(limit), Some(offset), Some(sort_desc))
        .await?;

    let (next, previous) = generate_pagination_links(total_count, limit, offset, &params);

    Ok(Json(PaginatedResponse {
        total_count,
        offset,
        limit,
        next,
        previous,
        data: items.into_iter().map(MeasurementResponse::from).collect(),
    }))
}

/// Most recent measurement
#[utoipa::path(
    get,
    path = "/api/v1/measurements/latest",
    responses(
        (status = 200, description = "Latest measurement", body = MeasurementResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "No measurements yet", body = ErrorResponse)
    ),
    security(("jwt_auth" = [])),
    tag = "measurements"
)]
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn latest_measurement(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
) -> Result<Json<MeasurementResponse>, ErrorResponse> {
    let measurement = state.measurements.latest_measurement(&user.user_id).await?;
    Ok(Json(measurement.into()))
}

/// Latest measurement with categories, ideal weight range and TDEE
#[utoipa::path(
    get,
    path = "/api/v1/measurements/insights",
    params(InsightsQueryParams),
    responses(
        (status = 200, description = "Insights for the latest measurement", body = InsightsResponse),
        (status = 400, description = "Unknown activity level", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "No measurements yet", body = ErrorResponse)
    ),
    security(("jwt_auth" = [])),
    tag = "measurements"
)]
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn measurement_insights(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Query(params): Query<InsightsQueryParams>,
) -> Result<Json<InsightsResponse>, ErrorResponse> {
    let activity_level = match params.activity_level.as_deref() {
        None => ActivityLevel::default(),
        Some(raw) => serde_json::from_value(serde_json::Value::String(raw.to_string()))
            .map_err(|_| ErrorResponse::bad_request(format!("Unknown activity level: {}", raw)))?,
    };

    let insights = state.measurements.insights(&user.user_id, activity_level).await?;
    Ok(Json(insights.into()))
}

/// A single measurement
#[utoipa::path(
    get,
    path = "/api/v1/measurements/{id}",
    params(("id" = String, Path, description = "Measurement ID")),
    responses(
        (status = 200, description = "Measurement", body = MeasurementResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Not found or owned by another user", body = ErrorResponse)
    ),
    security(("jwt_auth" = [])),
    tag = "measurements"
)]
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn get_measurement(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
) -> Result<Json<MeasurementResponse>, ErrorResponse> {
    let measurement = state.measurements.get_measurement(&user.user_id, &id).await?;
    Ok(Json(measurement.into()))
}

/// Edit a measurement. BMI and BMR are recomputed only when the weight changes.
#[utoipa::path(
    put,
    path = "/api/v1/measurements/{id}",
    params(("id" = String, Path, description = "Measurement ID")),
    request_body = UpdateMeasurementPayload,
    responses(
        (status = 200, description = "Measurement updated", body = MeasurementSavedResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Not found or owned by another user", body = ErrorResponse),
        (status = 409, description = "Another entry already exists for the new day", body = ErrorResponse)
    ),
    security(("jwt_auth" = [])),
    tag = "measurements"
)]
#[instrument(skip(state, user, payload), fields(user_id = %user.user_id))]
pub async fn update_measurement(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMeasurementPayload>, JsonRejection>,
) -> Result<Json<MeasurementSavedResponse>, ErrorResponse> {
    let payload = json_body(payload)?;
    let measurement = state.measurements.update_measurement(&user.user_id, &id, payload.into()).await?;

    Ok(Json(MeasurementSavedResponse {
        success: true,
        message: UPDATED.to_string(),
        measurement: measurement.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/measurements/{id}",
    params(("id" = String, Path, description = "Measurement ID")),
    responses(
        (status = 200, description = "Measurement deleted", body = MessageResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Not found or owned by another user", body = ErrorResponse)
    ),
    security(("jwt_auth" = [])),
    tag = "measurements"
)]
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn delete_measurement(
    State(state): State<AppState>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    state.measurements.delete_measurement(&user.user_id, &id).await?;
    info!("Measurement {} deleted", id);
    Ok(Json(MessageResponse::new(DELETED)))
}
