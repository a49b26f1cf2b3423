use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// Registers the bearer scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "jwt_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        crate::api::handlers::health::health_check,

        // Authentication
        crate::api::handlers::auth::signup,
        crate::api::handlers::auth::login,
        health_log_domain::auth::refresh_token,
        health_log_domain::auth::logout,
        health_log_domain::auth::auth_info,

        // Profile
        crate::api::handlers::profile::get_profile,
        crate::api::handlers::profile::update_profile,

        // Measurements
        crate::api::handlers::measurements::create_measurement,
        crate::api::handlers::measurements::list_measurements,
        crate::api::handlers::measurements::latest_measurement,
        crate::api::handlers::measurements::measurement_insights,
        crate::api::handlers::measurements::get_measurement,
        crate::api::handlers::measurements::update_measurement,
        crate::api::handlers::measurements::delete_measurement
    ),
    components(
        schemas(
            crate::api::handlers::error::ErrorResponse,
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus,

            crate::entities::common::MessageResponse,
            crate::entities::common::MeasurementPage,
            crate::entities::auth::SignUpPayload,
            crate::entities::auth::SignUpResponse,
            crate::entities::auth::LoginPayload,
            crate::entities::auth::LoginResponse,
            crate::entities::profile::ProfileResponse,
            crate::entities::profile::UpdateProfilePayload,
            crate::entities::profile::ProfileUpdatedResponse,
            crate::entities::measurement::MeasurementResponse,
            crate::entities::measurement::CreateMeasurementPayload,
            crate::entities::measurement::UpdateMeasurementPayload,
            crate::entities::measurement::MeasurementSavedResponse,
            crate::entities::measurement::InsightsResponse,

            health_log_domain::auth::UserInfo,
            health_log_domain::auth::TokenPair,
            health_log_domain::metrics::Gender,
            health_log_domain::metrics::ActivityLevel,
            health_log_domain::metrics::BmiCategory,
            health_log_domain::metrics::BodyFatCategory,
            health_log_domain::metrics::WeightRange
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "Authentication", description = "Signup, login and token management"),
        (name = "profile", description = "Demographic profile used for derived metrics"),
        (name = "measurements", description = "Body-composition measurements with derived BMI and BMR")
    ),
    info(
        title = "HealthLog API",
        version = "0.1.0",
        description = "Body-composition logging with BMI and BMR derived server-side",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;
