pub mod auth;
pub mod error;
pub mod health;
pub mod measurements;
pub mod profile;

#[cfg(test)]
mod tests;

pub use error::ErrorResponse;
pub use health::health_check;
