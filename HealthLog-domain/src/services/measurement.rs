use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use health_log_data::models::measurement::{MeasurementFilter, NewMeasurement};
use health_log_data::repository::{MeasurementRepositoryTrait, RepositoryError, UserRepositoryTrait};

use crate::entities::conversions::{self, format_date, format_timestamp};
use crate::entities::{
    CreateMeasurementRequest, Measurement, MeasurementInsights, UpdateMeasurementRequest, UserProfile,
};
use crate::metrics::{
    bmi_category, body_fat_category, calculate_tdee, ideal_weight_range, validate_health_metrics,
    ActivityLevel, DerivedMetrics, HealthMetricsInput,
};
use crate::services::validation_messages;

pub const DUPLICATE_DAY: &str = "มีการบันทึกข้อมูลของวันนี้แล้ว";
pub const MEASUREMENT_NOT_FOUND: &str = "ไม่พบข้อมูลการวัด";
pub const SAVE_FAILED: &str = "เกิดข้อผิดพลาดในการบันทึกข้อมูล";

/// Measurement service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// One message per failed rule, in reporting order
    #[error("Validation error: {}", .0.join(", "))]
    ValidationError(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The user already has an entry for that calendar day
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),
}

#[async_trait]
pub trait MeasurementServiceTrait {
    /// Record a measurement, deriving BMI and BMR from the owner's profile when it is complete
    async fn create_measurement(
        &self,
        user_id: &str,
        request: CreateMeasurementRequest,
    ) -> Result<Measurement, ServiceError>;

    async fn get_measurement(&self, user_id: &str, id: &str) -> Result<Measurement, ServiceError>;

    /// A page of the user's history and the total number of matching entries
    async fn list_measurements(
        &self,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: Option<usize>,
        offset: Option<usize>,
        sort_desc: Option<bool>,
    ) -> Result<(Vec<Measurement>, usize), ServiceError>;

    async fn update_measurement(
        &self,
        user_id: &str,
        id: &str,
        request: UpdateMeasurementRequest,
    ) -> Result<Measurement, ServiceError>;

    async fn delete_measurement(&self, user_id: &str, id: &str) -> Result<(), ServiceError>;

    async fn latest_measurement(&self, user_id: &str) -> Result<Measurement, ServiceError>;

    /// Latest measurement with categories, ideal weight range and TDEE
    async fn insights(
        &self,
        user_id: &str,
        activity_level: ActivityLevel,
    ) -> Result<MeasurementInsights, ServiceError>;
}

/// Measurement service over a measurement store and the user store holding demographics
pub struct MeasurementService<M: MeasurementRepositoryTrait, U: UserRepositoryTrait> {
    measurements: M,
    users: U,
}

impl<M, U> MeasurementService<M, U>
where
    M: MeasurementRepositoryTrait + Send + Sync,
    U: UserRepositoryTrait + Send + Sync,
{
    pub fn new(measurements: M, users: U) -> Self {
        Self { measurements, users }
    }

    fn map_repo_error(&self, err: RepositoryError) -> ServiceError {
        match err {
            RepositoryError::NotFound(_) => ServiceError::NotFound(MEASUREMENT_NOT_FOUND.to_string()),
            RepositoryError::Conflict(_) => ServiceError::Conflict(DUPLICATE_DAY.to_string()),
            RepositoryError::Validation(msg) => ServiceError::ValidationError(vec![msg]),
            _ => ServiceError::RepositoryError(err.to_string()),
        }
    }

    fn to_domain(&self, data: health_log_data::models::measurement::Measurement) -> Result<Measurement, ServiceError> {
        conversions::convert_to_domain_measurement(data).map_err(|e| {
            error!("Stored measurement is unreadable: {}", e);
            ServiceError::RepositoryError(e)
        })
    }

    async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>, ServiceError> {
        let user = self.users.get_by_id(user_id).await.map_err(|e| self.map_repo_error(e))?;
        match user.map(conversions::convert_to_domain_profile) {
            Some(Ok(profile)) => Ok(Some(profile)),
            Some(Err(e)) => {
                warn!("Profile for user {} is unreadable: {}", user_id, e);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// BMI and BMR for `weight`, or `None` when the profile is incomplete
    async fn derive(
        &self,
        user_id: &str,
        weight: f64,
        measured_on: NaiveDate,
    ) -> Result<Option<DerivedMetrics>, ServiceError> {
        let Some(profile) = self.profile(user_id).await? else {
            return Ok(None);
        };

        let demographics = match profile.demographics() {
            Ok(d) => d,
            Err(missing) => {
                debug!("Skipping derived metrics for user {}: {}", user_id, missing);
                return Ok(None);
            }
        };

        match DerivedMetrics::compute(&demographics, weight, measured_on) {
            Ok(derived) => Ok(Some(derived)),
            Err(e) => {
                warn!("Could not derive metrics for user {}: {}", user_id, e);
                Ok(None)
            }
        }
    }

    async fn owned(&self, user_id: &str, id: &str) -> Result<Measurement, ServiceError> {
        // A malformed id cannot belong to anyone
        let id = Uuid::parse_str(id).map_err(|_| ServiceError::NotFound(MEASUREMENT_NOT_FOUND.to_string()))?;

        let data = self.measurements
            .get_by_id(user_id, id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| ServiceError::NotFound(MEASUREMENT_NOT_FOUND.to_string()))?;

        self.to_domain(data)
    }
}

/// Structural rules from the request followed by the plausibility of the
/// submitted fat readings, reported together
fn check_submitted<T: Validate>(
    request: &T,
    body_fat_percentage: Option<f64>,
    visceral_fat: Option<f64>,
) -> Result<(), ServiceError> {
    let mut messages = match request.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => validation_messages(&errors),
    };

    messages.extend(
        validate_health_metrics(&HealthMetricsInput {
            body_fat_percentage,
            visceral_fat,
            ..Default::default()
        })
        .errors,
    );

    if messages.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::ValidationError(messages))
    }
}

/// Plausibility check over submitted and derived values
fn check_plausible(
    bmi: Option<f64>,
    bmr: Option<i32>,
    body_fat_percentage: f64,
    visceral_fat: Option<f64>,
) -> Result<(), ServiceError> {
    let result = validate_health_metrics(&HealthMetricsInput {
        bmi,
        bmr,
        body_fat_percentage: Some(body_fat_percentage),
        visceral_fat,
    });

    if result.valid {
        Ok(())
    } else {
        Err(ServiceError::ValidationError(result.errors))
    }
}

#[async_trait]
impl<M, U> MeasurementServiceTrait for MeasurementService<M, U>
where
    M: MeasurementRepositoryTrait + Send + Sync,
    U: UserRepositoryTrait + Send + Sync,
{
    #[instrument(skip(self, request))]
    async fn create_measurement(
        &self,
        user_id: &str,
        request: CreateMeasurementRequest,
    ) -> Result<Measurement, ServiceError> {
        check_submitted(&request, Some(request.body_fat_percentage), request.visceral_fat)?;

        let timestamp = request.timestamp.unwrap_or_else(|| Utc::now().fixed_offset());
        let derived = self.derive(user_id, request.weight, timestamp.date_naive()).await?.unwrap_or_default();

        check_plausible(derived.bmi, derived.bmr, request.body_fat_percentage, request.visceral_fat)?;

        let new = NewMeasurement {
            user_id: user_id.to_string(),
            timestamp: format_timestamp(timestamp.with_timezone(&Utc)),
            measured_on: format_date(timestamp.date_naive()),
            weight: request.weight,
            body_fat_percentage: request.body_fat_percentage,
            muscle_mass: request.muscle_mass,
            visceral_fat: request.visceral_fat,
            bmi: derived.bmi,
            bmr: derived.bmr,
        };

        let saved = self.measurements.create(new).await.map_err(|e| self.map_repo_error(e))?;
        debug!("Created measurement {} for user {}", saved.id, user_id);

        self.to_domain(saved)
    }

    #[instrument(skip(self))]
    async fn get_measurement(&self, user_id: &str, id: &str) -> Result<Measurement, ServiceError> {
        self.owned(user_id, id).await
    }

    #[instrument(skip(self))]
    async fn list_measurements(
        &self,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        limit: Option<usize>,
        offset: Option<usize>,
        sort_desc: Option<bool>,
    ) -> Result<(Vec<Measurement>, usize), ServiceError> {
        let filter = MeasurementFilter {
            start: start.map(format_timestamp),
            end: end.map(format_timestamp),
            limit,
            offset,
            sort_desc,
        };

        let (rows, total) = self.measurements
            .get_filtered(user_id, filter)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        let items = rows
            .into_iter()
            .map(|row| self.to_domain(row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((items, total))
    }

    #[instrument(skip(self, request))]
    async fn update_measurement(
        &self,
        user_id: &str,
        id: &str,
        request: UpdateMeasurementRequest,
    ) -> Result<Measurement, ServiceError> {
        check_submitted(&request, request.body_fat_percentage, request.visceral_fat.flatten())?;

        let mut measurement = self.owned(user_id, id).await?;

        if let Some(timestamp) = request.timestamp {
            measurement.timestamp = timestamp.with_timezone(&Utc);
            measurement.measured_on = timestamp.date_naive();
        }
        if let Some(body_fat) = request.body_fat_percentage {
            measurement.body_fat_percentage = body_fat;
        }
        if let Some(muscle) = request.muscle_mass {
            measurement.muscle_mass = muscle;
        }
        if let Some(visceral) = request.visceral_fat {
            measurement.visceral_fat = visceral;
        }

        // Derived metrics follow the weight; other edits keep the stored values
        if let Some(weight) = request.weight.filter(|w| *w != measurement.weight) {
            measurement.weight = weight;
            if let Some(derived) = self.derive(user_id, weight, measurement.measured_on).await? {
                measurement.bmi = derived.bmi;
                measurement.bmr = derived.bmr;
            }
        }

        check_plausible(
            measurement.bmi,
            measurement.bmr,
            measurement.body_fat_percentage,
            measurement.visceral_fat,
        )?;

        let saved = self.measurements
            .update(conversions::convert_to_data_measurement(&measurement))
            .await
            .map_err(|e| self.map_repo_error(e))?;

        self.to_domain(saved)
    }

    #[instrument(skip(self))]
    async fn delete_measurement(&self, user_id: &str, id: &str) -> Result<(), ServiceError> {
        let id = Uuid::parse_str(id).map_err(|_| ServiceError::NotFound(MEASUREMENT_NOT_FOUND.to_string()))?;

        let existed = self.measurements
            .delete(user_id, id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        if existed {
            Ok(())
        } else {
            Err(ServiceError::NotFound(MEASUREMENT_NOT_FOUND.to_string()))
        }
    }

    #[instrument(skip(self))]
    async fn latest_measurement(&self, user_id: &str) -> Result<Measurement, ServiceError> {
        let data = self.measurements
            .get_latest(user_id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| ServiceError::NotFound(MEASUREMENT_NOT_FOUND.to_string()))?;

        self.to_domain(data)
    }

    #[instrument(skip(self))]
    async fn insights(
        &self,
        user_id: &str,
        activity_level: ActivityLevel,
    ) -> Result<MeasurementInsights, ServiceError> {
        let measurement = self.latest_measurement(user_id).await?;
        let profile = self.profile(user_id).await?;

        let gender = profile.as_ref().and_then(|p| p.gender);
        let ideal_weight_range = profile
            .as_ref()
            .and_then(|p| p.height)
            .and_then(|h| ideal_weight_range(h).ok());

        Ok(MeasurementInsights {
            bmi_category: measurement.bmi.map(bmi_category),
            body_fat_category: gender.map(|g| body_fat_category(measurement.body_fat_percentage, g)),
            ideal_weight_range,
            activity_level,
            tdee: measurement.bmr.map(|bmr| calculate_tdee(bmr, activity_level)),
            generated_at: Utc::now(),
            measurement,
        })
    }
}

/// Create a measurement service using the repositories from the data layer
pub fn create_default_measurement_service() -> impl MeasurementServiceTrait + Send + Sync {
    MeasurementService::new(
        health_log_data::repository::MeasurementRepository::shared(),
        health_log_data::repository::UserRepository::shared(),
    )
}
