//! Service-level error carrying the failed operation.

use aturno_sheets::{ErrorKind, SheetsError};
use serde_json::Value;
use thiserror::Error;

/// A failed service operation.
///
/// Reports the kind, code and status of the underlying [`SheetsError`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Failed to {operation}: {source}")]
pub struct StoreError {
    pub operation: String,
    pub source: SheetsError,
}

impl StoreError {
    pub fn new(operation: impl Into<String>, source: SheetsError) -> Self {
        Self {
            operation: operation.into(),
            source,
        }
    }

    /// Adapter for `map_err`
    pub fn context(operation: &str) -> impl FnOnce(SheetsError) -> Self + '_ {
        move |source| Self::new(operation, source)
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind
    }

    pub fn code(&self) -> &'static str {
        self.source.code()
    }

    pub fn status(&self) -> u16 {
        self.source.status()
    }

    pub fn details(&self) -> Option<&Value> {
        self.source.details.as_ref()
    }
}
