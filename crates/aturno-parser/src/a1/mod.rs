//! A1 range parser using pest.

use std::fmt;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::ParseError;

#[derive(Parser)]
#[grammar = "a1/grammar.pest"]
pub struct RangeParser;

/// Highest addressable column (`ZZZ`), zero-based
pub const MAX_COLUMN_INDEX: usize = 18_277;

// ============================================================================
// Types
// ============================================================================

/// One end of a range: a column, and a row unless the range spans whole columns
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRef {
    /// Zero-based column index (`A` = 0)
    pub column: usize,
    /// One-based row number
    pub row: Option<u32>,
}

/// A parsed A1 range such as `Tasks!A2:L2` or `Projects!A:I`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetRange {
    pub sheet: Option<String>,
    pub start: CellRef,
    pub end: CellRef,
}

impl SheetRange {
    /// Whole columns `first..=last` of a sheet, e.g. `Tasks!A:L`
    pub fn columns(sheet: &str, first: usize, last: usize) -> Self {
        Self {
            sheet: Some(sheet.to_string()),
            start: CellRef { column: first, row: None },
            end: CellRef { column: last, row: None },
        }
    }

    /// Columns `0..width` of a single row, e.g. `Tasks!A7:L7`
    pub fn row(sheet: &str, width: usize, row: u32) -> Self {
        Self {
            sheet: Some(sheet.to_string()),
            start: CellRef { column: 0, row: Some(row) },
            end: CellRef {
                column: width.saturating_sub(1),
                row: Some(row),
            },
        }
    }

    /// Number of columns covered
    pub fn width(&self) -> usize {
        self.end.column.abs_diff(self.start.column) + 1
    }

    /// Render with the sheet name quoted when it contains spaces, as the
    /// remote API expects
    pub fn to_quoted_string(&self) -> String {
        match &self.sheet {
            Some(sheet) if sheet.contains(' ') => {
                format!("'{sheet}'!{}", self.span())
            }
            _ => self.to_string(),
        }
    }

    fn span(&self) -> String {
        format!("{}:{}", self.start, self.end)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&column_letter(self.column))?;
        if let Some(row) = self.row {
            write!(f, "{row}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{sheet}!")?;
        }
        f.write_str(&self.span())
    }
}

// ============================================================================
// Column Letters
// ============================================================================

/// Column letters for a zero-based index: 0 → `A`, 25 → `Z`, 26 → `AA`
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Zero-based index for uppercase column letters; `None` past `ZZZ`
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    let mut n: usize = 0;
    for b in letters.bytes() {
        n = n.checked_mul(26)?.checked_add(usize::from(b - b'A') + 1)?;
    }
    let index = n - 1;
    (index <= MAX_COLUMN_INDEX).then_some(index)
}

// ============================================================================
// Parser
// ============================================================================

/// Parse an A1 range
pub fn parse(input: &str) -> Result<SheetRange, ParseError> {
    let mut pairs = RangeParser::parse(Rule::range, input).map_err(|e| {
        let (line, column) = match e.line_col {
            pest::error::LineColLocation::Pos((l, c)) => (l, c),
            pest::error::LineColLocation::Span((l, c), _) => (l, c),
        };
        ParseError::Syntax {
            line,
            column,
            message: e.variant.message().to_string(),
        }
    })?;

    let range = pairs
        .next()
        .ok_or_else(|| ParseError::InvalidValue(format!("Empty range: {input}")))?;

    let mut sheet = None;
    let mut ends = None;
    for pair in range.into_inner() {
        match pair.as_rule() {
            Rule::sheet_name => sheet = Some(pair.as_str().to_string()),
            Rule::cell_span | Rule::column_span => ends = Some(parse_span(pair)?),
            _ => {}
        }
    }

    let (start, end) = ends.ok_or_else(|| ParseError::InvalidValue(format!("Missing span: {input}")))?;
    Ok(SheetRange { sheet, start, end })
}

fn parse_span(pair: Pair<Rule>) -> Result<(CellRef, CellRef), ParseError> {
    let mut refs = Vec::with_capacity(2);
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::cell => refs.push(parse_cell(inner)?),
            Rule::column => refs.push(CellRef {
                column: parse_column(inner.as_str())?,
                row: None,
            }),
            _ => {}
        }
    }
    match refs.as_slice() {
        [start, end] => Ok((*start, *end)),
        _ => Err(ParseError::InvalidValue("Range needs two ends".to_string())),
    }
}

fn parse_cell(pair: Pair<Rule>) -> Result<CellRef, ParseError> {
    let mut column = None;
    let mut row = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::column => column = Some(parse_column(inner.as_str())?),
            Rule::row => {
                row = Some(
                    inner
                        .as_str()
                        .parse::<u32>()
                        .map_err(|_| ParseError::InvalidValue(format!("Invalid row: {}", inner.as_str())))?,
                );
            }
            _ => {}
        }
    }
    let column = column.ok_or_else(|| ParseError::InvalidValue("Cell without column".to_string()))?;
    Ok(CellRef { column, row })
}

fn parse_column(letters: &str) -> Result<usize, ParseError> {
    column_index(letters).ok_or_else(|| ParseError::InvalidValue(format!("Column out of range: {letters}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(11), "L");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn column_indexes() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("Z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("ZZZ"), Some(MAX_COLUMN_INDEX));
        assert_eq!(column_index("AAAA"), None);
        assert_eq!(column_index("a"), None);
        assert_eq!(column_index(""), None);
    }

    #[test]
    fn parse_cell_span() {
        let range = parse("Tasks!A2:L2").unwrap();
        assert_eq!(range.sheet.as_deref(), Some("Tasks"));
        assert_eq!(range.start, CellRef { column: 0, row: Some(2) });
        assert_eq!(range.end, CellRef { column: 11, row: Some(2) });
        assert_eq!(range.width(), 12);
    }

    #[test]
    fn parse_column_span_without_sheet() {
        let range = parse("A:Z").unwrap();
        assert_eq!(range.sheet, None);
        assert_eq!(range.end.column, 25);
        assert_eq!(range.end.row, None);
    }

    #[test]
    fn builders_render_a1() {
        assert_eq!(SheetRange::columns("Projects", 0, 8).to_string(), "Projects!A:I");
        assert_eq!(SheetRange::row("Tasks", 12, 7).to_string(), "Tasks!A7:L7");
    }

    #[test]
    fn display_round_trips() {
        for input in ["Tasks!A1:L1", "Projects!A:I", "B3:C10", "My Sheet!A:A"] {
            assert_eq!(parse(input).unwrap().to_string(), input);
        }
    }

    #[test]
    fn quoted_form_for_spaced_names() {
        let range = parse("My Sheet!A1:B2").unwrap();
        assert_eq!(range.to_quoted_string(), "'My Sheet'!A1:B2");
        assert_eq!(parse("Tasks!A:L").unwrap().to_quoted_string(), "Tasks!A:L");
    }

    #[test]
    fn syntax_error_has_position() {
        let err = parse("Tasks!1A:2B").unwrap_err();
        match err {
            ParseError::Syntax { line, column, .. } => {
                assert_eq!(line, 1);
                assert_eq!(column, 7);
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }
}
