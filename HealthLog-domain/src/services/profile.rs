use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate};
use thiserror::Error;
use tracing::{debug, instrument};

use health_log_data::repository::{RepositoryError, UserRepositoryTrait};

use crate::entities::conversions;
use crate::entities::{Gender, UpdateProfileRequest, UserProfile};

pub const INVALID_GENDER: &str = "เพศไม่ถูกต้อง";
pub const INVALID_DATE_OF_BIRTH: &str = "วันเกิดไม่ถูกต้อง";
pub const FUTURE_DATE_OF_BIRTH: &str = "วันเกิดไม่สามารถเป็นวันในอนาคตได้";
pub const INVALID_HEIGHT: &str = "ส่วนสูงต้องอยู่ระหว่าง 1-300 ซม.";
pub const PROFILE_NOT_FOUND: &str = "ไม่พบข้อมูลผู้ใช้";

#[derive(Debug, Error)]
pub enum ProfileServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// Stored data could not be read back into a profile
    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait]
pub trait ProfileServiceTrait {
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, ProfileServiceError>;

    /// Merge the present fields of `request` into the stored profile.
    /// Past measurements keep the metrics they were saved with.
    async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, ProfileServiceError>;
}

pub struct ProfileService<U: UserRepositoryTrait> {
    users: U,
}

impl<U: UserRepositoryTrait> ProfileService<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    fn map_repo_error(&self, err: RepositoryError) -> ProfileServiceError {
        match err {
            RepositoryError::NotFound(_) => ProfileServiceError::NotFound(PROFILE_NOT_FOUND.to_string()),
            RepositoryError::Validation(msg) => ProfileServiceError::ValidationError(msg),
            _ => ProfileServiceError::RepositoryError(err.to_string()),
        }
    }

    async fn load(&self, user_id: &str) -> Result<UserProfile, ProfileServiceError> {
        let user = self.users
            .get_by_id(user_id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| ProfileServiceError::NotFound(PROFILE_NOT_FOUND.to_string()))?;

        conversions::convert_to_domain_profile(user).map_err(ProfileServiceError::Internal)
    }
}

pub fn parse_gender(value: &str) -> Result<Gender, ProfileServiceError> {
    value
        .parse::<Gender>()
        .map_err(|_| ProfileServiceError::ValidationError(INVALID_GENDER.to_string()))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp; the latter keeps its own calendar date
pub fn parse_date_of_birth(value: &str, today: NaiveDate) -> Result<NaiveDate, ProfileServiceError> {
    let value = value.trim();
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|ts| ts.date_naive()))
        .ok_or_else(|| ProfileServiceError::ValidationError(INVALID_DATE_OF_BIRTH.to_string()))?;

    if date > today {
        return Err(ProfileServiceError::ValidationError(FUTURE_DATE_OF_BIRTH.to_string()));
    }
    Ok(date)
}

pub fn check_height(height: f64) -> Result<f64, ProfileServiceError> {
    if height > 0.0 && height <= 300.0 {
        Ok(height)
    } else {
        Err(ProfileServiceError::ValidationError(INVALID_HEIGHT.to_string()))
    }
}

/// Apply an update request to a profile. Absent fields are left alone.
pub fn merge_profile(
    mut profile: UserProfile,
    request: &UpdateProfileRequest,
    today: NaiveDate,
) -> Result<UserProfile, ProfileServiceError> {
    if let Some(gender) = &request.gender {
        profile.gender = Some(parse_gender(gender)?);
    }
    if let Some(dob) = &request.date_of_birth {
        profile.date_of_birth = Some(parse_date_of_birth(dob, today)?);
    }
    if let Some(height) = request.height {
        profile.height = Some(check_height(height)?);
    }
    if let Some(name) = &request.name {
        let name = name.trim();
        profile.name = (!name.is_empty()).then(|| name.to_string());
    }
    Ok(profile)
}

#[async_trait]
impl<U: UserRepositoryTrait + Send + Sync> ProfileServiceTrait for ProfileService<U> {
    #[instrument(skip(self))]
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, ProfileServiceError> {
        self.load(user_id).await
    }

    #[instrument(skip(self, request))]
    async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, ProfileServiceError> {
        let current = self.load(user_id).await?;
        let merged = merge_profile(current, &request, Local::now().date_naive())?;

        let updated = self.users
            .update_profile(user_id, conversions::convert_to_data_profile(&merged))
            .await
            .map_err(|e| self.map_repo_error(e))?;

        debug!("Profile updated for user {}", user_id);
        conversions::convert_to_domain_profile(updated).map_err(ProfileServiceError::Internal)
    }
}

/// Create a profile service over the default user repository
pub fn create_default_profile_service() -> impl ProfileServiceTrait + Send + Sync {
    ProfileService::new(health_log_data::repository::UserRepository::shared())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use health_log_data::models::user::{NewUser, ProfileUpdate, User};
    use mockall::mock;

    mock! {
        pub Users {}

        #[async_trait]
        impl UserRepositoryTrait for Users {
            async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;
            async fn get_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError>;
            async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
            async fn update_profile(&self, id: &str, profile: ProfileUpdate) -> Result<User, RepositoryError>;
        }
    }

    const USER_ID: &str = "8b0f7c2e-3f4a-4a57-9a43-2d5c1f1e9b10";

    fn stored_user() -> User {
        User {
            id: USER_ID.to_string(),
            email: "ann@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            name: Some("Ann".to_string()),
            gender: Some("female".to_string()),
            date_of_birth: Some("1990-01-01".to_string()),
            height: Some(160.0),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_update_merges_only_present_fields() {
        let mut users = MockUsers::new();
        users.expect_get_by_id().times(1).returning(|_| Ok(Some(stored_user())));
        users.expect_update_profile().times(1).returning(|_, update| {
            assert_eq!(update.name.as_deref(), Some("Ann"));
            assert_eq!(update.gender.as_deref(), Some("female"));
            assert_eq!(update.date_of_birth.as_deref(), Some("1990-01-01"));
            assert_eq!(update.height, Some(165.5));

            let mut user = stored_user();
            user.height = update.height;
            Ok(user)
        });

        let service = ProfileService::new(users);
        let request = UpdateProfileRequest { height: Some(165.5), ..Default::default() };
        let profile = service.update_profile(USER_ID, request).await.unwrap();

        assert_eq!(profile.height, Some(165.5));
        assert!(profile.is_complete());
    }

    #[tokio::test]
    async fn test_invalid_gender_never_reaches_storage() {
        let mut users = MockUsers::new();
        users.expect_get_by_id().returning(|_| Ok(Some(stored_user())));
        users.expect_update_profile().never();

        let service = ProfileService::new(users);
        let request = UpdateProfileRequest { gender: Some("robot".to_string()), ..Default::default() };
        let err = service.update_profile(USER_ID, request).await.unwrap_err();

        assert!(matches!(err, ProfileServiceError::ValidationError(ref m) if m == INVALID_GENDER));
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let mut users = MockUsers::new();
        users.expect_get_by_id().returning(|_| Ok(None));

        let service = ProfileService::new(users);
        assert!(matches!(
            service.get_profile(USER_ID).await,
            Err(ProfileServiceError::NotFound(_))
        ));
    }

    #[test]
    fn test_date_of_birth_rules() {
        let today = date(2024, 6, 1);
        assert_eq!(parse_date_of_birth("1990-01-01", today).unwrap(), date(1990, 1, 1));
        assert_eq!(parse_date_of_birth("1990-01-01T23:00:00-05:00", today).unwrap(), date(1990, 1, 1));
        assert_eq!(parse_date_of_birth("2024-06-01", today).unwrap(), today);

        let err = parse_date_of_birth("not a date", today).unwrap_err();
        assert_eq!(err.to_string(), format!("Validation error: {}", INVALID_DATE_OF_BIRTH));

        let err = parse_date_of_birth("2024-06-02", today).unwrap_err();
        assert_eq!(err.to_string(), format!("Validation error: {}", FUTURE_DATE_OF_BIRTH));
    }

    #[test]
    fn test_height_bounds() {
        assert!(check_height(300.0).is_ok());
        assert!(check_height(0.5).is_ok());
        assert!(check_height(0.0).is_err());
        assert!(check_height(300.1).is_err());
        assert!(check_height(f64::NAN).is_err());
    }

    #[test]
    fn test_blank_name_clears_it() {
        let profile = conversions::convert_to_domain_profile(stored_user()).unwrap();
        let request = UpdateProfileRequest { name: Some("   ".to_string()), ..Default::default() };
        let merged = merge_profile(profile, &request, date(2024, 6, 1)).unwrap();
        assert_eq!(merged.name, None);
        assert_eq!(merged.gender, Some(Gender::Female));
    }
}
