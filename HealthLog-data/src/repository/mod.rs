// Repository module structure
pub mod errors;
mod in_memory;
mod measurement;
mod storage;
mod user;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use measurement::{MeasurementRepository, MeasurementRepositoryTrait};
pub use user::{UserRepository, UserRepositoryTrait};

// Mock repositories for both testing and when mock feature is enabled
#[cfg(any(test, feature = "mock"))]
pub mod mocks {
    pub use super::measurement::tests::MockMeasurementRepository;
    pub use super::user::tests::MockUserRepository;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::measurement::{MeasurementFilter, NewMeasurement};
    use crate::models::user::{NewUser, ProfileUpdate};

    // No pool is initialized in unit tests, so the repositories run on in-memory storage

    #[tokio::test]
    async fn test_measurement_repository_falls_back_to_memory() {
        let repo = MeasurementRepository::new();
        let new = NewMeasurement {
            user_id: "u1".to_string(),
            timestamp: "2024-03-01T08:00:00+00:00".to_string(),
            measured_on: "2024-03-01".to_string(),
            weight: 70.0,
            body_fat_percentage: 20.0,
            muscle_mass: 30.0,
            visceral_fat: None,
            bmi: Some(22.9),
            bmr: Some(1629),
        };

        let created = repo.create(new.clone()).await.unwrap();
        assert!(matches!(repo.create(new).await, Err(RepositoryError::Conflict(_))));

        let id = uuid::Uuid::parse_str(&created.id).unwrap();
        assert_eq!(repo.get_by_id("u1", id).await.unwrap(), Some(created.clone()));
        assert_eq!(repo.get_by_id("u2", id).await.unwrap(), None);

        let (page, total) = repo.get_filtered("u1", MeasurementFilter::default()).await.unwrap();
        assert_eq!((page.len(), total), (1, 1));

        let mut edited = created.clone();
        edited.weight = 69.2;
        let saved = repo.update(edited).await.unwrap();
        assert_eq!(saved.weight, 69.2);
        assert!(repo.delete("u1", id).await.unwrap());
    }

    #[tokio::test]
    async fn test_user_repository_profile_round() {
        let repo = UserRepository::new();
        let user = repo
            .create(NewUser {
                email: "ann@example.com".to_string(),
                password_hash: "hash".to_string(),
                name: Some("Ann".to_string()),
            })
            .await
            .unwrap();

        let profile = ProfileUpdate {
            name: Some("Ann".to_string()),
            gender: Some("female".to_string()),
            date_of_birth: Some("1990-01-01".to_string()),
            height: Some(162.0),
        };
        let updated = repo.update_profile(&user.id, profile).await.unwrap();
        assert_eq!(updated.gender.as_deref(), Some("female"));
        assert_eq!(updated.height, Some(162.0));

        let missing = repo.update_profile("nope", ProfileUpdate::default()).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_shared_repositories_see_each_other() {
        let writer = UserRepository::shared();
        let reader = UserRepository::shared();
        let isolated = UserRepository::new();

        let user = writer
            .create(NewUser {
                email: "shared-fallback@example.com".to_string(),
                password_hash: "hash".to_string(),
                name: None,
            })
            .await
            .unwrap();

        assert!(reader.get_by_id(&user.id).await.unwrap().is_some());
        assert!(isolated.get_by_id(&user.id).await.unwrap().is_none());
    }
}
