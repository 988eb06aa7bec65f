//! The spreadsheet client.
//!
//! Every remote call goes through [`SheetsClient`]: ranges are validated
//! before anything is sent, transport failures are normalized into
//! [`SheetsError`]s, and reads and idempotent overwrites are retried with
//! backoff. Appends and sheet creation are attempted once, since repeating
//! them could duplicate rows or sheets.

use std::sync::Arc;

use aturno_core::mapping::{self, rows_to_positional_records, ColumnMapping, HeaderMode, Record, Row};
use aturno_parser::{parse_range, SheetRange};
use tracing::{debug, instrument};

use crate::config::SheetsConfig;
use crate::error::SheetsError;
use crate::google::GoogleSheetsTransport;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::transport::{SheetsTransport, ValueRange};

/// Values read from a range, with the range the service resolved
pub type SheetData = ValueRange;

/// One target of [`SheetsClient::batch_update`]
#[derive(Clone, Debug, PartialEq)]
pub struct RangeUpdate {
    pub range: String,
    pub values: Vec<Row>,
}

impl RangeUpdate {
    pub fn new(range: impl Into<String>, values: Vec<Row>) -> Self {
        Self {
            range: range.into(),
            values,
        }
    }
}

/// Client for one spreadsheet
#[derive(Clone)]
pub struct SheetsClient {
    transport: Arc<dyn SheetsTransport>,
    spreadsheet_id: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

fn parse(range: &str) -> Result<SheetRange, SheetsError> {
    parse_range(range).map_err(|_| SheetsError::validation(format!("Invalid range format: {range}")))
}

impl SheetsClient {
    pub fn new(transport: Arc<dyn SheetsTransport>, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            transport,
            spreadsheet_id: spreadsheet_id.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Client backed by the Google Sheets REST API
    pub fn from_config(config: &SheetsConfig) -> Result<Self, SheetsError> {
        let transport = GoogleSheetsTransport::new(config).map_err(|e| {
            SheetsError::configuration(format!("Failed to initialize Google Sheets client: {e}"))
        })?;
        Ok(Self::new(Arc::new(transport), config.spreadsheet_id.clone()))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    // ========================================================================
    // Remote operations
    // ========================================================================

    /// Read a range. Trailing empty rows and cells are not returned.
    #[instrument(skip(self), level = "debug")]
    pub async fn read_range(&self, range: &str) -> Result<SheetData, SheetsError> {
        let parsed = parse(range)?;
        let (transport, parsed) = (&self.transport, &parsed);
        retry_with_backoff(&self.retry, "read_range", move || async move {
            transport.get_values(parsed).await.map_err(SheetsError::from)
        })
        .await
    }

    /// Overwrite a range starting at its top-left cell
    #[instrument(skip(self, values), fields(rows = values.len()), level = "debug")]
    pub async fn write_range(&self, range: &str, values: &[Row]) -> Result<(), SheetsError> {
        let parsed = parse(range)?;
        let (transport, parsed) = (&self.transport, &parsed);
        retry_with_backoff(&self.retry, "write_range", move || async move {
            transport.update_values(parsed, values).await.map_err(SheetsError::from)
        })
        .await
    }

    /// Append rows after the last occupied row of column A of a sheet
    #[instrument(skip(self, values), fields(rows = values.len()), level = "debug")]
    pub async fn append_data(&self, sheet_name: &str, values: &[Row]) -> Result<(), SheetsError> {
        let parsed = parse(&format!("{sheet_name}!A:A"))?;
        self.transport
            .append_values(&parsed, values)
            .await
            .map_err(SheetsError::from)
    }

    /// Blank the cells of a range; row positions are kept
    #[instrument(skip(self), level = "debug")]
    pub async fn clear_range(&self, range: &str) -> Result<(), SheetsError> {
        let parsed = parse(range)?;
        let (transport, parsed) = (&self.transport, &parsed);
        retry_with_backoff(&self.retry, "clear_range", move || async move {
            transport.clear_values(parsed).await.map_err(SheetsError::from)
        })
        .await
    }

    /// Overwrite several ranges in one remote call. Every range is validated
    /// before anything is sent.
    #[instrument(skip(self, updates), fields(ranges = updates.len()), level = "debug")]
    pub async fn batch_update(&self, updates: &[RangeUpdate]) -> Result<(), SheetsError> {
        let data = updates
            .iter()
            .map(|u| Ok((parse(&u.range)?, u.values.clone())))
            .collect::<Result<Vec<_>, SheetsError>>()?;
        let (transport, data) = (&self.transport, &data);
        retry_with_backoff(&self.retry, "batch_update", move || async move {
            transport.batch_update_values(data).await.map_err(SheetsError::from)
        })
        .await
    }

    /// Add a sheet. Fails if a sheet with that name exists.
    #[instrument(skip(self), level = "debug")]
    pub async fn create_sheet(&self, sheet_name: &str) -> Result<(), SheetsError> {
        parse(&format!("{sheet_name}!A:A"))
            .map_err(|_| SheetsError::validation_field(format!("Invalid sheet name: {sheet_name}"), "sheet_name"))?;
        self.transport.add_sheet(sheet_name).await.map_err(SheetsError::from)
    }

    /// Titles of every sheet, in tab order
    #[instrument(skip(self), level = "debug")]
    pub async fn get_sheet_names(&self) -> Result<Vec<String>, SheetsError> {
        let transport = &self.transport;
        retry_with_backoff(&self.retry, "get_sheet_names", move || async move {
            transport.sheet_titles().await.map_err(SheetsError::from)
        })
        .await
    }

    /// Records of `sheet_name` with any field containing `term`, ignoring case.
    ///
    /// With a mapping, rows are keyed by field name; without one, by `col_N`
    /// and the first row is skipped as a header.
    #[instrument(skip(self, mapping), level = "debug")]
    pub async fn search_in_sheet(
        &self,
        sheet_name: &str,
        term: &str,
        mapping: Option<&ColumnMapping>,
    ) -> Result<Vec<Record>, SheetsError> {
        let data = self.read_range(&format!("{sheet_name}!A:Z")).await?;
        let records = match mapping {
            Some(mapping) => Self::map_rows_to_objects(&data, mapping, HeaderMode::FirstRow),
            None => rows_to_positional_records(&data.values),
        };

        let needle = term.to_lowercase();
        let matches: Vec<Record> = records
            .into_iter()
            .filter(|record| {
                record
                    .values()
                    .any(|value| value.as_text().to_lowercase().contains(&needle))
            })
            .collect();
        debug!(sheet = sheet_name, matches = matches.len(), "Search complete");
        Ok(matches)
    }

    // ========================================================================
    // Mapping
    // ========================================================================

    /// Rows to records keyed by field name
    pub fn map_rows_to_objects(data: &SheetData, mapping: &ColumnMapping, mode: HeaderMode) -> Vec<Record> {
        mapping::rows_to_records(&data.values, mapping, mode)
    }

    /// Records to rows in mapping order, optionally preceded by the header row
    pub fn map_objects_to_rows(records: &[Record], mapping: &ColumnMapping, include_headers: bool) -> Vec<Row> {
        mapping::records_to_rows(records, mapping, include_headers)
    }
}
