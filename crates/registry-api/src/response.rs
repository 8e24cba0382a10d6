//! API Response wrapper

use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use registry_core::error::{DomainError, FieldError};

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldIssue>,
}

/// One field-level problem: the offending field plus a human-readable reason.
#[derive(Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub reason: String,
}

impl From<&FieldError> for FieldIssue {
    fn from(e: &FieldError) -> Self {
        Self {
            field: e.field.to_string(),
            reason: e.reason.clone(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self::error_with_details(code, message, Vec::new())
    }

    pub fn error_with_details(code: &str, message: &str, details: Vec<FieldIssue>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
                details,
            }),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

pub type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);

pub fn validation_response(details: Vec<FieldIssue>) -> ErrorResponse {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::error_with_details(
            "VALIDATION_ERROR",
            "Validation failed",
            details,
        )),
    )
}

pub fn not_found_response() -> ErrorResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("NOT_FOUND", "User not found")),
    )
}

/// Map a domain failure onto the transport contract: validation problems are
/// 422, uniqueness conflicts 400 with the conflicting field, missing records
/// 404. Database faults become an opaque 500; their content never reaches
/// the client.
pub fn domain_error_response(err: DomainError) -> ErrorResponse {
    match err {
        DomainError::Validation(fields) => {
            validation_response(fields.iter().map(FieldIssue::from).collect())
        }
        DomainError::Conflict(field) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error_with_details(
                "CONFLICT",
                field.message(),
                vec![FieldIssue {
                    field: field.as_str().to_string(),
                    reason: field.message().to_string(),
                }],
            )),
        ),
        DomainError::NotFound(_) => not_found_response(),
        DomainError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error("INTERNAL_ERROR", "Internal server error")),
        ),
    }
}
