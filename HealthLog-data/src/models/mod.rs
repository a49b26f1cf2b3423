pub mod measurement;
pub mod user;
