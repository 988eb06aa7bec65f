//! Row ↔ record mapping.
//!
//! A sheet is a grid of [`CellValue`]s. A [`ColumnMapping`] is the ordered
//! list of `(header display name, field name)` pairs describing one sheet;
//! column order is significant because rows are written positionally.
//!
//! The transforms here are pure: [`rows_to_records`] keys each cell by the
//! field its header maps to, [`records_to_rows`] lays records back out in
//! mapping order.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest number of columns a mapping may span (A..Z)
pub const MAX_COLUMNS: usize = 26;

// ============================================================================
// Cells
// ============================================================================

/// A single cell as exchanged with the spreadsheet API
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// One sheet row
pub type Row = Vec<CellValue>;

/// One mapped row, keyed by field name
pub type Record = BTreeMap<String, CellValue>;

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Empty cells and whitespace-only text both count as blank
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Bool(_) | CellValue::Number(_) => false,
        }
    }

    /// String form used for display, search and parsing
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Empty => Cow::Borrowed(""),
            CellValue::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            CellValue::Number(n) => Cow::Owned(format_number(*n)),
            CellValue::Text(s) => Cow::Borrowed(s),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// True when every cell of the row is blank (or the row has no cells)
pub fn is_blank_row(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_blank)
}

// ============================================================================
// Column Mapping
// ============================================================================

/// Errors in mapping definitions or in mapped data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    #[error("Column mapping is empty")]
    Empty,

    #[error("Column mapping has {0} columns, at most 26 are supported")]
    TooManyColumns(usize),

    #[error("Duplicate column header: {0}")]
    DuplicateHeader(String),

    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    #[error("Header row does not match column {column}: expected '{expected}', found '{found}'")]
    HeaderMismatch {
        column: usize,
        expected: String,
        found: String,
    },

    #[error("Missing value for '{0}'")]
    MissingValue(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// One `(display name, field name)` pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub header: String,
    pub field: String,
}

/// Ordered association of header display names and field names
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: Vec<Column>,
}

/// How [`rows_to_records`] finds the header names
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeaderMode {
    /// The first row of the data is the header row and is not a record
    #[default]
    FirstRow,
    /// The data has no header row; the mapping's order is used
    Mapping,
}

impl ColumnMapping {
    /// Build a mapping, checking it is non-empty, addressable and free of
    /// duplicate headers or fields.
    pub fn new<H, F>(pairs: impl IntoIterator<Item = (H, F)>) -> Result<Self, MappingError>
    where
        H: Into<String>,
        F: Into<String>,
    {
        let columns: Vec<Column> = pairs
            .into_iter()
            .map(|(header, field)| Column {
                header: header.into(),
                field: field.into(),
            })
            .collect();

        if columns.is_empty() {
            return Err(MappingError::Empty);
        }
        if columns.len() > MAX_COLUMNS {
            return Err(MappingError::TooManyColumns(columns.len()));
        }

        let mut headers = HashSet::new();
        let mut fields = HashSet::new();
        for column in &columns {
            if !headers.insert(column.header.as_str()) {
                return Err(MappingError::DuplicateHeader(column.header.clone()));
            }
            if !fields.insert(column.field.as_str()) {
                return Err(MappingError::DuplicateField(column.field.clone()));
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Field name for a header display name
    pub fn field_for(&self, header: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.header == header)
            .map(|c| c.field.as_str())
    }

    /// Zero-based column position of a field
    pub fn position_of(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.field == field)
    }

    /// The header row as it is written to the sheet
    pub fn header_row(&self) -> Row {
        self.columns
            .iter()
            .map(|c| CellValue::Text(c.header.clone()))
            .collect()
    }

    /// Verify a header row read from the sheet matches this mapping exactly
    pub fn check_header_row(&self, row: &[CellValue]) -> Result<(), MappingError> {
        for (index, column) in self.columns.iter().enumerate() {
            let found = row.get(index).map(|c| c.as_text()).unwrap_or_default();
            if found.trim() != column.header {
                return Err(MappingError::HeaderMismatch {
                    column: index + 1,
                    expected: column.header.clone(),
                    found: found.into_owned(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Transforms
// ============================================================================

/// Convert sheet rows to records keyed by field name.
///
/// Headers with no entry in the mapping keep their display name as key.
/// Cells missing from short rows become [`CellValue::Empty`].
pub fn rows_to_records(rows: &[Row], mapping: &ColumnMapping, mode: HeaderMode) -> Vec<Record> {
    if rows.is_empty() {
        return Vec::new();
    }

    let (headers, data): (Vec<String>, &[Row]) = match mode {
        HeaderMode::FirstRow => (
            rows[0].iter().map(|c| c.as_text().into_owned()).collect(),
            &rows[1..],
        ),
        HeaderMode::Mapping => (
            mapping.columns().iter().map(|c| c.header.clone()).collect(),
            rows,
        ),
    };

    data.iter()
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(index, header)| {
                    let key = mapping.field_for(header).unwrap_or(header.as_str()).to_string();
                    (key, row.get(index).cloned().unwrap_or_default())
                })
                .collect()
        })
        .collect()
}

/// Convert records to sheet rows laid out in mapping order.
///
/// Fields absent from a record become [`CellValue::Empty`]. With
/// `include_headers` the header row is prepended, even when there are no
/// records.
pub fn records_to_rows(records: &[Record], mapping: &ColumnMapping, include_headers: bool) -> Vec<Row> {
    let mut rows = Vec::with_capacity(records.len() + usize::from(include_headers));
    if include_headers {
        rows.push(mapping.header_row());
    }
    rows.extend(records.iter().map(|record| {
        mapping
            .columns()
            .iter()
            .map(|c| record.get(&c.field).cloned().unwrap_or_default())
            .collect::<Row>()
    }));
    rows
}

/// Records with synthetic `col_N` keys, used when no mapping is known.
/// The first row is treated as a header row and skipped.
pub fn rows_to_positional_records(rows: &[Row]) -> Vec<Record> {
    rows.iter()
        .skip(1)
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(index, cell)| (format!("col_{index}"), cell.clone()))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mapping() -> ColumnMapping {
        ColumnMapping::new([("ID", "id"), ("Name", "name"), ("Budget", "budget")]).unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::text(s)
    }

    #[test]
    fn mapping_rejects_duplicates_and_empty() {
        assert_eq!(
            ColumnMapping::new(Vec::<(&str, &str)>::new()),
            Err(MappingError::Empty)
        );
        assert_eq!(
            ColumnMapping::new([("ID", "id"), ("ID", "other")]),
            Err(MappingError::DuplicateHeader("ID".into()))
        );
        assert_eq!(
            ColumnMapping::new([("ID", "id"), ("Key", "id")]),
            Err(MappingError::DuplicateField("id".into()))
        );
    }

    #[test]
    fn mapping_rejects_more_than_26_columns() {
        let pairs: Vec<(String, String)> = (0..27).map(|i| (format!("H{i}"), format!("f{i}"))).collect();
        assert_eq!(ColumnMapping::new(pairs), Err(MappingError::TooManyColumns(27)));
    }

    #[test]
    fn lookups() {
        let m = mapping();
        assert_eq!(m.field_for("Name"), Some("name"));
        assert_eq!(m.field_for("Missing"), None);
        assert_eq!(m.position_of("budget"), Some(2));
        assert_eq!(m.header_row(), vec![text("ID"), text("Name"), text("Budget")]);
    }

    #[test]
    fn rows_with_header_row() {
        let rows = vec![
            vec![text("ID"), text("Name"), text("Budget")],
            vec![text("p1"), text("Alpha"), CellValue::Number(10.0)],
            vec![text("p2"), text("Beta")],
        ];
        let records = rows_to_records(&rows, &mapping(), HeaderMode::FirstRow);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], text("p1"));
        assert_eq!(records[0]["budget"], CellValue::Number(10.0));
        assert_eq!(records[1]["budget"], CellValue::Empty);
    }

    #[test]
    fn rows_without_header_row_use_mapping_order() {
        let rows = vec![vec![text("p1"), text("Alpha"), text("5")]];
        let records = rows_to_records(&rows, &mapping(), HeaderMode::Mapping);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], text("Alpha"));
    }

    #[test]
    fn unmapped_headers_keep_display_name() {
        let rows = vec![vec![text("ID"), text("Notes")], vec![text("p1"), text("hello")]];
        let records = rows_to_records(&rows, &mapping(), HeaderMode::FirstRow);
        assert_eq!(records[0]["Notes"], text("hello"));
    }

    #[test]
    fn empty_rows_give_no_records() {
        assert!(rows_to_records(&[], &mapping(), HeaderMode::FirstRow).is_empty());
    }

    #[test]
    fn records_to_rows_orders_by_mapping() {
        let mut record = Record::new();
        record.insert("budget".into(), text("7"));
        record.insert("id".into(), text("p9"));
        record.insert("ignored".into(), text("x"));

        let rows = records_to_rows(&[record], &mapping(), false);
        assert_eq!(rows, vec![vec![text("p9"), CellValue::Empty, text("7")]]);
    }

    #[test]
    fn records_to_rows_headers_only_when_empty() {
        let rows = records_to_rows(&[], &mapping(), true);
        assert_eq!(rows, vec![mapping().header_row()]);
        assert!(records_to_rows(&[], &mapping(), false).is_empty());
    }

    #[test]
    fn positional_records_skip_first_row() {
        let rows = vec![vec![text("A"), text("B")], vec![text("x"), CellValue::Bool(true)]];
        let records = rows_to_positional_records(&rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["col_0"], text("x"));
        assert_eq!(records[0]["col_1"], CellValue::Bool(true));
    }

    #[test]
    fn header_check() {
        let m = mapping();
        assert!(m.check_header_row(&m.header_row()).is_ok());

        let err = m
            .check_header_row(&[text("ID"), text("Title"), text("Budget")])
            .unwrap_err();
        assert_eq!(
            err,
            MappingError::HeaderMismatch {
                column: 2,
                expected: "Name".into(),
                found: "Title".into(),
            }
        );
        assert!(m.check_header_row(&[]).is_err());
    }

    #[test]
    fn cell_text_forms() {
        assert_eq!(CellValue::Number(5000.0).as_text(), "5000");
        assert_eq!(CellValue::Number(12.5).as_text(), "12.5");
        assert_eq!(CellValue::Bool(false).as_text(), "false");
        assert_eq!(CellValue::Empty.as_text(), "");
        assert!(CellValue::text("   ").is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
        assert!(is_blank_row(&[]));
        assert!(is_blank_row(&[CellValue::Empty, text("")]));
    }

    #[test]
    fn cells_deserialize_from_api_json() {
        let row: Row = serde_json::from_str(r#"["a", 1.5, true, null]"#).unwrap();
        assert_eq!(
            row,
            vec![text("a"), CellValue::Number(1.5), CellValue::Bool(true), CellValue::Empty]
        );
    }
}
