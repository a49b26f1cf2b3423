use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, instrument};

use health_log_data::models::user::NewUser;
use health_log_data::repository::{RepositoryError, UserRepositoryTrait};

use crate::auth::logging::{log_failed_login, log_registration, log_successful_login};
use crate::auth::password::{hash_password, verify_password};
use crate::entities::conversions;
use crate::entities::{Credentials, SignUpRequest, UserProfile};

pub const MISSING_CREDENTIALS: &str = "กรุณากรอกอีเมลและรหัสผ่าน";
pub const PASSWORD_TOO_SHORT: &str = "รหัสผ่านต้องมีอย่างน้อย 8 ตัวอักษร";
pub const EMAIL_TAKEN: &str = "อีเมลนี้ถูกใช้งานแล้ว";
pub const INVALID_CREDENTIALS: &str = "อีเมลหรือรหัสผ่านไม่ถูกต้อง";

const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Error)]
pub enum AccountServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The email is already registered
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Repository error: {0}")]
    RepositoryError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait]
pub trait AccountServiceTrait {
    /// Register a new account and return its (empty) profile
    async fn sign_up(&self, request: SignUpRequest) -> Result<UserProfile, AccountServiceError>;

    /// Check credentials and return the account's profile
    async fn authenticate(&self, credentials: Credentials) -> Result<UserProfile, AccountServiceError>;
}

pub struct AccountService<U: UserRepositoryTrait> {
    users: U,
}

impl<U: UserRepositoryTrait> AccountService<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    fn map_repo_error(&self, err: RepositoryError) -> AccountServiceError {
        match err {
            RepositoryError::Conflict(_) => AccountServiceError::Conflict(EMAIL_TAKEN.to_string()),
            RepositoryError::Validation(msg) => AccountServiceError::ValidationError(msg),
            _ => AccountServiceError::RepositoryError(err.to_string()),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl<U: UserRepositoryTrait + Send + Sync> AccountServiceTrait for AccountService<U> {
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn sign_up(&self, request: SignUpRequest) -> Result<UserProfile, AccountServiceError> {
        let email = normalize_email(&request.email);
        if email.is_empty() || request.password.is_empty() {
            return Err(AccountServiceError::ValidationError(MISSING_CREDENTIALS.to_string()));
        }
        if request.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AccountServiceError::ValidationError(PASSWORD_TOO_SHORT.to_string()));
        }

        // Early check gives a clean 409; the unique index still guards the race
        if self.users.get_by_email(&email).await.map_err(|e| self.map_repo_error(e))?.is_some() {
            return Err(AccountServiceError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let password_hash = hash_password(&request.password)
            .map_err(|e| AccountServiceError::Internal(e.to_string()))?;

        let name = request.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let user = self.users
            .create(NewUser { email, password_hash, name })
            .await
            .map_err(|e| self.map_repo_error(e))?;

        log_registration(&user.id);

        conversions::convert_to_domain_profile(user).map_err(AccountServiceError::Internal)
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn authenticate(&self, credentials: Credentials) -> Result<UserProfile, AccountServiceError> {
        let email = normalize_email(&credentials.email);
        if email.is_empty() || credentials.password.is_empty() {
            return Err(AccountServiceError::ValidationError(MISSING_CREDENTIALS.to_string()));
        }

        let user = match self.users.get_by_email(&email).await.map_err(|e| self.map_repo_error(e))? {
            Some(user) => user,
            None => {
                debug!("Login for unknown email");
                log_failed_login(&email, "unknown email");
                return Err(AccountServiceError::InvalidCredentials);
            }
        };

        match verify_password(&credentials.password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                log_failed_login(&email, "wrong password");
                return Err(AccountServiceError::InvalidCredentials);
            }
            Err(e) => {
                error!("Stored password hash for user {} is unreadable: {}", user.id, e);
                log_failed_login(&email, "unreadable password hash");
                return Err(AccountServiceError::InvalidCredentials);
            }
        }

        log_successful_login(&user.id);

        conversions::convert_to_domain_profile(user).map_err(AccountServiceError::Internal)
    }
}

/// Create an account service over the default user repository
pub fn create_default_account_service() -> impl AccountServiceTrait + Send + Sync {
    AccountService::new(health_log_data::repository::UserRepository::shared())
}
