//! Error taxonomy for remote spreadsheet failures.
//!
//! Every failure leaving this crate is a [`SheetsError`] carrying one of a
//! fixed set of [`ErrorKind`]s. The kind decides the error code, the HTTP
//! status surfaced to callers and whether the retry helper may try again.

use serde_json::{json, Value};
use thiserror::Error;

use crate::transport::TransportError;

/// Category of a spreadsheet failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authentication,
    NotFound,
    Validation,
    RateLimit,
    Configuration,
    Unknown,
}

impl ErrorKind {
    /// Stable error code reported to API clients
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Authentication => "SHEETS_AUTH_ERROR",
            ErrorKind::NotFound => "SHEETS_NOT_FOUND",
            ErrorKind::Validation => "SHEETS_VALIDATION_ERROR",
            ErrorKind::RateLimit => "SHEETS_QUOTA_ERROR",
            ErrorKind::Configuration => "SHEETS_CONFIG_ERROR",
            ErrorKind::Unknown => "SHEETS_UNKNOWN_ERROR",
        }
    }

    /// HTTP status associated with the kind
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::Authentication => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Validation => 400,
            ErrorKind::RateLimit => 429,
            ErrorKind::Configuration | ErrorKind::Unknown => 500,
        }
    }

    /// Only transient kinds are worth another attempt
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::RateLimit | ErrorKind::Unknown)
    }
}

/// Classify an untyped failure by its message and, when known, its HTTP status.
///
/// A recognized status wins; otherwise the lowercase message is matched
/// against keyword groups in a fixed order.
pub fn classify(message: &str, status: Option<u16>) -> ErrorKind {
    match status {
        Some(401 | 403) => return ErrorKind::Authentication,
        Some(404) => return ErrorKind::NotFound,
        Some(429) => return ErrorKind::RateLimit,
        _ => {}
    }

    let message = message.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

    if has(&["unauthorized", "invalid credentials"]) {
        ErrorKind::Authentication
    } else if has(&["quota", "rate limit"]) {
        ErrorKind::RateLimit
    } else if has(&["not found", "does not exist"]) {
        ErrorKind::NotFound
    } else if has(&["invalid", "malformed"]) {
        ErrorKind::Validation
    } else {
        ErrorKind::Unknown
    }
}

/// A normalized spreadsheet error
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SheetsError {
    pub kind: ErrorKind,
    pub message: String,
    /// Extra diagnostic payload, surfaced only outside production
    pub details: Option<Value>,
}

impl SheetsError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// `"<resource> with ID '<id>' not found"`
    pub fn not_found(resource: &str, id: &str) -> Self {
        Self::new(ErrorKind::NotFound, format!("{resource} with ID '{id}' not found"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn validation_field(message: impl Into<String>, field: &str) -> Self {
        Self::validation(message).with_details(json!({ "field": field }))
    }

    pub fn quota() -> Self {
        Self::new(ErrorKind::RateLimit, "Google Sheets API quota exceeded")
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Normalize a raw transport failure
    pub fn from_transport(err: TransportError) -> Self {
        let kind = classify(&err.message, err.status);
        let details = json!({ "status": err.status, "message": err.message });
        let normalized = match kind {
            ErrorKind::Authentication => Self::authentication("Invalid Google Sheets credentials"),
            ErrorKind::RateLimit => Self::quota(),
            ErrorKind::NotFound => Self::new(kind, "Resource not found"),
            ErrorKind::Validation | ErrorKind::Configuration | ErrorKind::Unknown => {
                Self::new(kind, err.message)
            }
        };
        normalized.with_details(details)
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn status(&self) -> u16 {
        self.kind.status()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<TransportError> for SheetsError {
    fn from(err: TransportError) -> Self {
        Self::from_transport(err)
    }
}

impl From<aturno_parser::ParseError> for SheetsError {
    fn from(err: aturno_parser::ParseError) -> Self {
        Self::validation(format!("Invalid range format: {err}"))
    }
}
