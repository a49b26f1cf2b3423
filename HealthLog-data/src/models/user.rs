use serde::{Deserialize, Serialize};

/// Storage model for an account together with its demographic profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub name: Option<String>,
    /// `male`, `female` or `other`
    pub gender: Option<String>,
    /// `YYYY-MM-DD`
    pub date_of_birth: Option<String>,
    /// Height in centimeters
    pub height: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input data for registering an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
}

/// Profile columns written by a profile update. The caller merges optional
/// request fields over the stored row before saving.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub height: Option<f64>,
}
