//! JSON error envelope.

use aturno_sheets::SheetsError;
use aturno_store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Error Body
// =============================================================================

/// Body of every failed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always `false`
    pub success: bool,
    /// Error code, or a short summary for request-level failures
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

// =============================================================================
// Error Response
// =============================================================================

/// Status code plus [`ErrorBody`]
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiErrorResponse {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                success: false,
                error: error.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, message)
    }

    /// Envelope for a normalized spreadsheet error. `details` is dropped
    /// unless `expose_details` is set.
    pub fn from_sheets(error: &SheetsError, expose_details: bool) -> Self {
        let status =
            StatusCode::from_u16(error.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = Self::new(status, error.code(), error.message.clone());
        if expose_details {
            response.body.details = error.details.clone();
        }
        response
    }

    /// Like [`ApiErrorResponse::from_sheets`], with the failed operation
    /// prefixed to the message
    pub fn from_store(error: &StoreError, expose_details: bool) -> Self {
        let mut response = Self::from_sheets(&error.source, expose_details);
        response.body.message = error.to_string();
        response
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
