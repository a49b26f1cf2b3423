// Domain services
// Business rules between the HTTP layer and the repositories.

pub mod account;
pub mod measurement;
pub mod profile;

use validator::ValidationErrors;

pub use account::{AccountServiceError, AccountServiceTrait, create_default_account_service};
pub use measurement::{MeasurementServiceTrait, ServiceError, create_default_measurement_service};
pub use profile::{ProfileServiceError, ProfileServiceTrait, create_default_profile_service};

/// Flatten validator errors into their user-facing messages, ordered by field name
pub(crate) fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(msg) => msg.to_string(),
                None => format!("Invalid {}", field),
            })
        })
        .collect()
}
