//! The seam between the client and the remote spreadsheet service.

use async_trait::async_trait;
use aturno_core::Row;
use aturno_parser::SheetRange;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A block of values and the range it came from or goes to
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    #[serde(default)]
    pub values: Vec<Row>,
}

/// Raw failure reported by a transport, before normalization
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status when the failure came from an HTTP response
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

/// Remote spreadsheet primitives, scoped to one spreadsheet.
///
/// Reads trim trailing empty rows and trailing empty cells of each row, the
/// way the remote API does. Interior blank rows come back as empty rows.
#[async_trait]
pub trait SheetsTransport: Send + Sync {
    /// Read the values of a range
    async fn get_values(&self, range: &SheetRange) -> Result<ValueRange, TransportError>;

    /// Overwrite the cells of a range starting at its top-left corner
    async fn update_values(&self, range: &SheetRange, values: &[Row]) -> Result<(), TransportError>;

    /// Append rows after the last occupied row of the range's table
    async fn append_values(&self, range: &SheetRange, values: &[Row]) -> Result<(), TransportError>;

    /// Blank the contents of a range; rows are not removed
    async fn clear_values(&self, range: &SheetRange) -> Result<(), TransportError>;

    /// Overwrite several ranges in one call
    async fn batch_update_values(&self, data: &[(SheetRange, Vec<Row>)]) -> Result<(), TransportError>;

    /// Add a sheet (tab) with the given title
    async fn add_sheet(&self, title: &str) -> Result<(), TransportError>;

    /// Titles of every sheet, in tab order
    async fn sheet_titles(&self) -> Result<Vec<String>, TransportError>;
}
