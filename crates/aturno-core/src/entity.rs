//! Entity codecs: typed entities ↔ sheet records.
//!
//! Each entity type owns its sheet name and its fixed column mapping. The
//! mappings are checked once, on first use.
//!
//! Coercions the sheet cannot express natively happen here:
//! - task labels are joined with `", "` on write and split on `,` on read
//! - project budgets are written as text and parsed back to a decimal from
//!   the leading numeric part of the cell (`"1250 USD"` reads as 1250,
//!   blank or non-numeric text reads as zero)
//! - timestamps are RFC 3339 text, due dates `YYYY-MM-DD`

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use regex::Regex;

use crate::mapping::{CellValue, ColumnMapping, MappingError, Record};
use crate::{format_timestamp, Project, ProjectStatus, Task, TaskPriority, TaskStatus};

/// Separator used when a label list is stored in a single cell
pub const LABEL_DELIMITER: char = ',';

/// Display-name → field-name table of the `Tasks` sheet (columns A..L)
pub static TASK_COLUMNS: LazyLock<ColumnMapping> = LazyLock::new(|| {
    ColumnMapping::new([
        ("ID", "id"),
        ("Project ID", "project_id"),
        ("Title", "title"),
        ("Description", "description"),
        ("Status", "status"),
        ("Priority", "priority"),
        ("Assigned To", "assigned_to"),
        ("Due Date", "due_date"),
        ("Created By", "created_by"),
        ("Created At", "created_at"),
        ("Updated At", "updated_at"),
        ("Labels", "labels"),
    ])
    .expect("task column mapping is well-formed")
});

/// Display-name → field-name table of the `Projects` sheet (columns A..I)
pub static PROJECT_COLUMNS: LazyLock<ColumnMapping> = LazyLock::new(|| {
    ColumnMapping::new([
        ("ID", "id"),
        ("Team ID", "team_id"),
        ("Name", "name"),
        ("Description", "description"),
        ("Budget", "budget"),
        ("Created By", "created_by"),
        ("Created At", "created_at"),
        ("Status", "status"),
        ("Color", "color"),
    ])
    .expect("project column mapping is well-formed")
});

/// An entity stored one-per-row in a dedicated sheet
pub trait SheetEntity: Sized + Clone + Send + Sync + 'static {
    /// Name of the sheet holding this entity
    const SHEET_NAME: &'static str;

    /// Human-readable entity name used in error messages
    const ENTITY_NAME: &'static str;

    /// The sheet's column mapping
    fn columns() -> &'static ColumnMapping;

    fn id(&self) -> &str;

    /// Encode as a record; every mapped field is present
    fn to_record(&self) -> Record;

    /// Decode a record read from the sheet.
    ///
    /// Returns `Ok(None)` for a row that holds no entity: a cleared row, or
    /// one whose id cell is blank.
    fn from_record(record: &Record) -> Result<Option<Self>, MappingError>;
}

// ============================================================================
// Cell helpers
// ============================================================================

fn cell<'a>(record: &'a Record, field: &str) -> &'a CellValue {
    static EMPTY: CellValue = CellValue::Empty;
    record.get(field).unwrap_or(&EMPTY)
}

fn optional_text(record: &Record, field: &str) -> Option<String> {
    let value = cell(record, field);
    if value.is_blank() {
        None
    } else {
        Some(value.as_text().into_owned())
    }
}

fn text_or_empty(record: &Record, field: &str) -> String {
    optional_text(record, field).unwrap_or_default()
}

fn invalid(field: &str, message: impl Into<String>) -> MappingError {
    MappingError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn parse_or_default<T>(record: &Record, field: &str) -> Result<T, MappingError>
where
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    match optional_text(record, field) {
        None => Ok(T::default()),
        Some(s) => s.parse().map_err(|e: T::Err| invalid(field, e.to_string())),
    }
}

fn timestamp(record: &Record, field: &str) -> Result<DateTime<Utc>, MappingError> {
    let raw = optional_text(record, field).ok_or_else(|| MappingError::MissingValue(field.to_string()))?;
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| invalid(field, format!("'{raw}' is not an RFC 3339 timestamp ({e})")))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept)
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn optional_date(record: &Record, field: &str) -> Result<Option<NaiveDate>, MappingError> {
    match optional_text(record, field) {
        None => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| invalid(field, format!("'{raw}' is not a date"))),
    }
}

fn text_cell(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

fn optional_cell(value: Option<&str>) -> CellValue {
    CellValue::Text(value.unwrap_or_default().to_string())
}

// ============================================================================
// Labels
// ============================================================================

/// Join labels into the single-cell storage form
pub fn join_labels(labels: &[String]) -> String {
    labels.join(", ")
}

/// Trim surrounding whitespace from each label, keeping order.
///
/// The cell form is trimmed on read, so labels are stored the same way.
pub fn normalize_labels(labels: Vec<String>) -> Vec<String> {
    labels
        .into_iter()
        .map(|label| label.trim().to_string())
        .collect()
}

/// Split the single-cell storage form back into labels, dropping blanks
pub fn split_labels(raw: &str) -> Vec<String> {
    raw.split(LABEL_DELIMITER)
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Budget
// ============================================================================

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid number regex")
});

/// Read a budget cell from its leading number; text without one becomes zero
pub fn parse_budget(value: &CellValue) -> Decimal {
    match value {
        CellValue::Number(n) => Decimal::from_f64(*n).unwrap_or_default(),
        CellValue::Text(s) => LEADING_NUMBER
            .find(s.trim())
            .and_then(|m| {
                let number = m.as_str();
                Decimal::from_str(number)
                    .or_else(|_| Decimal::from_scientific(number))
                    .ok()
            })
            .unwrap_or_default(),
        CellValue::Empty | CellValue::Bool(_) => Decimal::ZERO,
    }
}

// ============================================================================
// Task
// ============================================================================

impl SheetEntity for Task {
    const SHEET_NAME: &'static str = "Tasks";
    const ENTITY_NAME: &'static str = "Task";

    fn columns() -> &'static ColumnMapping {
        &TASK_COLUMNS
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn to_record(&self) -> Record {
        let due_date = self.due_date.map(|d| d.format("%Y-%m-%d").to_string());
        Record::from([
            ("id".to_string(), text_cell(&self.id)),
            ("project_id".to_string(), text_cell(&self.project_id)),
            ("title".to_string(), text_cell(&self.title)),
            ("description".to_string(), optional_cell(self.description.as_deref())),
            ("status".to_string(), text_cell(self.status.as_str())),
            ("priority".to_string(), text_cell(self.priority.as_str())),
            ("assigned_to".to_string(), optional_cell(self.assigned_to.as_deref())),
            ("due_date".to_string(), optional_cell(due_date.as_deref())),
            ("created_by".to_string(), text_cell(&self.created_by)),
            ("created_at".to_string(), text_cell(&format_timestamp(&self.created_at))),
            ("updated_at".to_string(), text_cell(&format_timestamp(&self.updated_at))),
            ("labels".to_string(), CellValue::Text(join_labels(&self.labels))),
        ])
    }

    fn from_record(record: &Record) -> Result<Option<Self>, MappingError> {
        let Some(id) = optional_text(record, "id") else {
            return Ok(None);
        };

        Ok(Some(Task {
            id,
            project_id: text_or_empty(record, "project_id"),
            title: text_or_empty(record, "title"),
            description: optional_text(record, "description"),
            status: parse_or_default::<TaskStatus>(record, "status")?,
            priority: parse_or_default::<TaskPriority>(record, "priority")?,
            assigned_to: optional_text(record, "assigned_to"),
            due_date: optional_date(record, "due_date")?,
            created_by: text_or_empty(record, "created_by"),
            created_at: timestamp(record, "created_at")?,
            updated_at: timestamp(record, "updated_at")?,
            labels: split_labels(&cell(record, "labels").as_text()),
        }))
    }
}

// ============================================================================
// Project
// ============================================================================

impl SheetEntity for Project {
    const SHEET_NAME: &'static str = "Projects";
    const ENTITY_NAME: &'static str = "Project";

    fn columns() -> &'static ColumnMapping {
        &PROJECT_COLUMNS
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn to_record(&self) -> Record {
        Record::from([
            ("id".to_string(), text_cell(&self.id)),
            ("team_id".to_string(), text_cell(&self.team_id)),
            ("name".to_string(), text_cell(&self.name)),
            ("description".to_string(), optional_cell(self.description.as_deref())),
            ("budget".to_string(), CellValue::Text(self.budget.normalize().to_string())),
            ("created_by".to_string(), text_cell(&self.created_by)),
            ("created_at".to_string(), text_cell(&format_timestamp(&self.created_at))),
            ("status".to_string(), text_cell(self.status.as_str())),
            ("color".to_string(), optional_cell(self.color.as_deref())),
        ])
    }

    fn from_record(record: &Record) -> Result<Option<Self>, MappingError> {
        let Some(id) = optional_text(record, "id") else {
            return Ok(None);
        };

        Ok(Some(Project {
            id,
            team_id: text_or_empty(record, "team_id"),
            name: text_or_empty(record, "name"),
            description: optional_text(record, "description"),
            budget: parse_budget(cell(record, "budget")),
            created_by: text_or_empty(record, "created_by"),
            created_at: timestamp(record, "created_at")?,
            status: parse_or_default::<ProjectStatus>(record, "status")?,
            color: optional_text(record, "color"),
        }))
    }
}
