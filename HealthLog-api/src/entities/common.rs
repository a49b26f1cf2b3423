use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::measurement::MeasurementResponse;

/// Paginated response format
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[aliases(MeasurementPage = PaginatedResponse<MeasurementResponse>)]
pub struct PaginatedResponse<T> {
    /// Total number of items matching the filter
    pub total_count: usize,

    pub offset: usize,

    pub limit: usize,

    /// URL for the next page, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,

    /// URL for the previous page, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,

    /// The data items for this page
    pub data: Vec<T>,
}

/// Confirmation with no payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
