//! # aturno-parser
//!
//! Parser for spreadsheet A1 range addresses.
//!
//! This crate provides:
//! - A pest grammar for `[SheetName!]A1:B2` and `[SheetName!]A:B`
//! - Column letter ↔ index arithmetic
//! - Range builders and formatting
//!
//! ## Example
//!
//! ```rust
//! use aturno_parser::{parse_range, SheetRange};
//!
//! let range = parse_range("Tasks!A2:L2").unwrap();
//! assert_eq!(range.sheet.as_deref(), Some("Tasks"));
//! assert_eq!(range.width(), 12);
//! assert_eq!(SheetRange::row("Tasks", 12, 2), range);
//! ```

pub mod a1;

use thiserror::Error;

pub use a1::{column_index, column_letter, CellRef, SheetRange};

/// Parsing error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Parse an A1 range address
pub fn parse_range(input: &str) -> Result<SheetRange, ParseError> {
    a1::parse(input)
}

/// True when `input` is a well-formed A1 range
pub fn is_valid_range(input: &str) -> bool {
    parse_range(input).is_ok()
}
