//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::scheduling::ConflictKind;
use crate::services::SchedulingError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured details (field name, conflict report, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Error returned by HTTP handlers; wraps whatever the service raised.
#[derive(Debug)]
pub struct AppError(pub SchedulingError);

impl AppError {
    fn status_and_body(self) -> (StatusCode, ApiError) {
        scheduling_response(self.0)
    }
}

fn scheduling_response(err: SchedulingError) -> (StatusCode, ApiError) {
    let code = err.code();
    let message = err.to_string();
    match err {
        SchedulingError::Validation { field, .. } => (
            StatusCode::BAD_REQUEST,
            ApiError::new(code, message).with_details(serde_json::json!({ "field": field })),
        ),
        SchedulingError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            ApiError::new(code, message)
                .with_details(serde_json::json!({ "entity": entity, "id": id })),
        ),
        SchedulingError::Conflict(report) => {
            // A request that only breaks business hours is a bad request, not a clash.
            let status = if report.kinds() == vec![ConflictKind::OutsideHours] {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::CONFLICT
            };
            let details = serde_json::to_value(&*report).unwrap_or(serde_json::Value::Null);
            (status, ApiError::new(code, message).with_details(details))
        }
        SchedulingError::InvalidTransition { from, to } => (
            StatusCode::CONFLICT,
            ApiError::new(code, message)
                .with_details(serde_json::json!({ "from": from, "to": to })),
        ),
        SchedulingError::SlotUnavailable(_) | SchedulingError::Concurrency(_) => {
            (StatusCode::CONFLICT, ApiError::new(code, message))
        }
        SchedulingError::Internal(detail) => {
            log::error!("Internal scheduling error: {}", detail);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new(code, "An internal error occurred"),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_body();
        (status, Json(error)).into_response()
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        AppError(err)
    }
}
