use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

use health_log_domain::auth::{auth_info, auth_middleware, configure_auth, logout, refresh_token};
use health_log_domain::health::HealthServiceTrait;
use health_log_domain::services::{
    create_default_account_service, create_default_measurement_service, create_default_profile_service,
    AccountServiceTrait, MeasurementServiceTrait, ProfileServiceTrait,
};

use crate::api::handlers::{auth, health, measurements, profile};
use crate::openapi::configure_swagger_routes;

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountServiceTrait + Send + Sync>,
    pub profiles: Arc<dyn ProfileServiceTrait + Send + Sync>,
    pub measurements: Arc<dyn MeasurementServiceTrait + Send + Sync>,
}

impl AppState {
    /// Services over the configured database, or shared in-memory storage without one
    pub fn from_defaults() -> Self {
        Self {
            accounts: Arc::new(create_default_account_service()),
            profiles: Arc::new(create_default_profile_service()),
            measurements: Arc::new(create_default_measurement_service()),
        }
    }
}

#[cfg(any(test, feature = "mock"))]
impl From<health_log_domain::testing::MockServices> for AppState {
    fn from(services: health_log_domain::testing::MockServices) -> Self {
        Self {
            accounts: services.accounts,
            profiles: services.profiles,
            measurements: services.measurements,
        }
    }
}

/// Create the application router
pub async fn create_app() -> Router {
    health::initialize_server_start_time();
    build_router(AppState::from_defaults(), health::create_health_service())
}

/// Assemble routes and middleware around the given services
pub fn build_router(state: AppState, health_service: Arc<dyn HealthServiceTrait + Send + Sync>) -> Router {
    debug!("Creating application router");

    // Specific routes before parametrized ones
    let api_routes: Router<AppState> = Router::new()
        .route("/profile", get(profile::get_profile).put(profile::update_profile))
        .route("/measurements/latest", get(measurements::latest_measurement))
        .route("/measurements/insights", get(measurements::measurement_insights))
        .route(
            "/measurements",
            get(measurements::list_measurements).post(measurements::create_measurement),
        )
        .route(
            "/measurements/:id",
            get(measurements::get_measurement)
                .put(measurements::update_measurement)
                .delete(measurements::delete_measurement),
        )
        .route_layer(middleware::from_fn(auth_middleware));

    let auth_routes: Router<AppState> = Router::new()
        .route("/auth/info", get(auth_info))
        .route("/auth/logout", post(logout))
        .route_layer(middleware::from_fn(auth_middleware));

    let public_routes: Router<AppState> = Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(refresh_token))
        .layer(Extension(health_service));

    let app = Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .with_state(state)
        .merge(configure_swagger_routes())
        .layer(TraceLayer::new_for_http());

    debug!("Routes configured");

    configure_auth(app)
}
