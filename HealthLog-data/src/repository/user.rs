use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use async_trait::async_trait;

use crate::models::user::{NewUser, ProfileUpdate, User};
use crate::database::get_db_pool;
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for accounts and their demographic profile
#[async_trait]
pub trait UserRepositoryTrait {
    /// Register an account; an email already in use is a `Conflict`
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    /// Case-insensitive email lookup
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Replace the profile columns and return the stored account
    async fn update_profile(&self, id: &str, profile: ProfileUpdate) -> Result<User, RepositoryError>;
}

#[derive(Debug, Clone, Default)]
pub struct UserRepository {
    storage: InMemoryStorage,
}

impl UserRepository {
    /// Repository with its own private fallback storage
    pub fn new() -> Self {
        Self {
            storage: InMemoryStorage::new(),
        }
    }

    /// Repository whose fallback storage is shared process-wide
    pub fn shared() -> Self {
        Self {
            storage: InMemoryStorage::shared(),
        }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn create(&self, new: NewUser) -> Result<User, RepositoryError> {
        let now = Utc::now().to_rfc3339();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            gender: None,
            date_of_birth: None,
            height: None,
            created_at: now.clone(),
            updated_at: now,
        };

        match get_db_pool() {
            Ok(pool) => {
                debug!("Storing user in database: {}", user.id);
                DatabaseStorage::insert_user(&pool, &user).await?;
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage", e);
                self.storage.insert_user(&user).await?;
            }
        }

        Ok(user)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => DatabaseStorage::get_user_by_id(&pool, id).await,
            Err(_) => self.storage.get_user_by_id(id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        match get_db_pool() {
            Ok(pool) => DatabaseStorage::get_user_by_email(&pool, email).await,
            Err(_) => self.storage.get_user_by_email(email).await,
        }
    }

    async fn update_profile(&self, id: &str, profile: ProfileUpdate) -> Result<User, RepositoryError> {
        let now = Utc::now().to_rfc3339();

        match get_db_pool() {
            Ok(pool) => DatabaseStorage::update_profile(&pool, id, &profile, &now).await?,
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for update_profile", e);
                self.storage.update_profile(id, &profile, &now).await?
            }
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl<T: UserRepositoryTrait + Send + Sync + ?Sized> UserRepositoryTrait for Arc<T> {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        (**self).create(user).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        (**self).get_by_id(id).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        (**self).get_by_email(email).await
    }

    async fn update_profile(&self, id: &str, profile: ProfileUpdate) -> Result<User, RepositoryError> {
        (**self).update_profile(id, profile).await
    }
}

/// Mock user repository for testing
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockUserRepository {
        users: Mutex<Vec<User>>,
    }

    impl MockUserRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock repository with predefined accounts
        pub fn with_users(users: Vec<User>) -> Self {
            Self { users: Mutex::new(users) }
        }
    }

    #[async_trait]
    impl UserRepositoryTrait for MockUserRepository {
        async fn create(&self, new: NewUser) -> Result<User, RepositoryError> {
            let mut users = self.users.lock()?;
            if users.iter().any(|u| u.email.eq_ignore_ascii_case(&new.email)) {
                return Err(RepositoryError::Conflict("email is already registered".to_string()));
            }

            let user = User {
                id: Uuid::new_v4().to_string(),
                email: new.email,
                password_hash: new.password_hash,
                name: new.name,
                gender: None,
                date_of_birth: None,
                height: None,
                created_at: "2024-01-01T00:00:00+00:00".to_string(),
                updated_at: "2024-01-01T00:00:00+00:00".to_string(),
            };
            users.push(user.clone());
            Ok(user)
        }

        async fn get_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
            let users = self.users.lock()?;
            Ok(users.iter().find(|u| u.id == id).cloned())
        }

        async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
            let users = self.users.lock()?;
            Ok(users.iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
        }

        async fn update_profile(&self, id: &str, profile: ProfileUpdate) -> Result<User, RepositoryError> {
            let mut users = self.users.lock()?;
            let user = users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

            user.name = profile.name;
            user.gender = profile.gender;
            user.date_of_birth = profile.date_of_birth;
            user.height = profile.height;
            Ok(user.clone())
        }
    }
}
