//! Shared HTTP plumbing: response envelope and error mapping

pub mod validated_json;

pub use validated_json::ValidatedJson;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Standard API response envelope.
///
/// Success: `{"success": true, "data": {...}}`,
/// failure: `{"success": false, "data": null, "error": "..."}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Empty response for operations without return data
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmptyData {}

pub type ApiError<T> = (StatusCode, Json<ApiResponse<T>>);
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError<T>>;

pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::UnknownSlot(_) | DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::SlotUnavailable(_)
        | DomainError::SlotNotReserved(_)
        | DomainError::SlotNotOccupied(_)
        | DomainError::AlreadyPaid(_) => StatusCode::CONFLICT,
        DomainError::EmailMismatch(_) => StatusCode::FORBIDDEN,
        DomainError::InvalidInterval { .. } | DomainError::Validation(_) => {
            StatusCode::BAD_REQUEST
        }
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Turn a domain error into an error response. Storage details stay in
/// the log.
pub fn domain_error<T>(error: DomainError) -> ApiError<T> {
    let status = status_for(&error);
    let message = if error.is_transient() {
        tracing::error!(error = %error, "Storage failure");
        "Internal storage error, please retry".to_string()
    } else {
        error.to_string()
    };
    (status, Json(ApiResponse::error(message)))
}
