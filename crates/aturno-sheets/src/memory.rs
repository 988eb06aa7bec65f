//! In-process spreadsheet transport.
//!
//! Keeps every sheet as a grid of cells behind a mutex and reproduces the
//! range semantics of the remote API closely enough for the services built on
//! top of it: trailing blank rows and cells are trimmed on read, appends land
//! after the last row whose first column is occupied, and clearing leaves a
//! blank row in place.
//!
//! Failures can be queued with [`MemoryTransport::fail_next`] to exercise the
//! retry and normalization paths.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use aturno_core::{CellValue, Row};
use aturno_parser::SheetRange;

use crate::transport::{SheetsTransport, TransportError, ValueRange};

#[derive(Debug, Default)]
struct Workbook {
    /// Sheets in tab order
    sheets: Vec<(String, Vec<Row>)>,
    injected: VecDeque<TransportError>,
    calls: usize,
}

impl Workbook {
    fn sheet(&self, range: &SheetRange) -> Result<&Vec<Row>, TransportError> {
        let index = self.sheet_index(range)?;
        Ok(&self.sheets[index].1)
    }

    fn sheet_mut(&mut self, range: &SheetRange) -> Result<&mut Vec<Row>, TransportError> {
        let index = self.sheet_index(range)?;
        Ok(&mut self.sheets[index].1)
    }

    fn sheet_index(&self, range: &SheetRange) -> Result<usize, TransportError> {
        match &range.sheet {
            None if !self.sheets.is_empty() => Ok(0),
            None => Err(unparsable(range)),
            Some(name) => self
                .sheets
                .iter()
                .position(|(title, _)| title == name)
                .ok_or_else(|| unparsable(range)),
        }
    }

    fn write(&mut self, range: &SheetRange, values: &[Row]) -> Result<(), TransportError> {
        let grid = self.sheet_mut(range)?;
        let top = first_row(range);
        write_block(grid, top, range.start.column, values);
        Ok(())
    }
}

fn unparsable(range: &SheetRange) -> TransportError {
    TransportError::http(400, format!("Unable to parse range: {range}"))
}

fn first_row(range: &SheetRange) -> usize {
    range.start.row.map_or(0, |r| (r as usize).saturating_sub(1))
}

fn last_row(range: &SheetRange) -> Option<usize> {
    range.end.row.map(|r| (r as usize).saturating_sub(1))
}

fn write_block(grid: &mut Vec<Row>, top: usize, left: usize, values: &[Row]) {
    for (offset, row) in values.iter().enumerate() {
        let target = top + offset;
        if grid.len() <= target {
            grid.resize_with(target + 1, Vec::new);
        }
        let cells = &mut grid[target];
        if cells.len() < left + row.len() {
            cells.resize(left + row.len(), CellValue::Empty);
        }
        for (column, value) in row.iter().enumerate() {
            cells[left + column] = value.clone();
        }
    }
}

fn trim_row(mut row: Row) -> Row {
    while row.last().is_some_and(|c| matches!(c, CellValue::Empty) || c.as_text().is_empty()) {
        row.pop();
    }
    row
}

/// In-memory [`SheetsTransport`]. Cloning shares the same workbook.
#[derive(Clone, Debug, Default)]
pub struct MemoryTransport {
    workbook: Arc<Mutex<Workbook>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport with the given sheets already present and empty
    pub fn with_sheets<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let transport = Self::new();
        if let Ok(mut workbook) = transport.workbook.lock() {
            workbook.sheets = titles.into_iter().map(|t| (t.into(), Vec::new())).collect();
        }
        transport
    }

    /// Make the next `times` operations fail with `error`
    pub fn fail_next(&self, times: usize, error: TransportError) {
        if let Ok(mut workbook) = self.workbook.lock() {
            workbook.injected.extend(std::iter::repeat(error).take(times));
        }
    }

    /// Number of operations attempted so far, including injected failures
    pub fn calls(&self) -> usize {
        self.workbook.lock().map_or(0, |w| w.calls)
    }

    /// Snapshot of a sheet's raw grid
    pub fn grid(&self, title: &str) -> Option<Vec<Row>> {
        let workbook = self.workbook.lock().ok()?;
        workbook
            .sheets
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, grid)| grid.clone())
    }

    /// Lock the workbook for one operation, counting it and consuming any
    /// queued failure
    fn begin(&self) -> Result<MutexGuard<'_, Workbook>, TransportError> {
        let mut workbook = self
            .workbook
            .lock()
            .map_err(|_| TransportError::other("memory workbook lock poisoned"))?;
        workbook.calls += 1;
        match workbook.injected.pop_front() {
            Some(err) => Err(err),
            None => Ok(workbook),
        }
    }
}

#[async_trait]
impl SheetsTransport for MemoryTransport {
    async fn get_values(&self, range: &SheetRange) -> Result<ValueRange, TransportError> {
        let workbook = self.begin()?;
        let grid = workbook.sheet(range)?;

        let top = first_row(range);
        let bottom = last_row(range).unwrap_or(usize::MAX);
        let left = range.start.column;
        let right = range.end.column;

        let mut values: Vec<Row> = grid
            .iter()
            .enumerate()
            .skip(top)
            .take_while(|(index, _)| *index <= bottom)
            .map(|(_, row)| {
                let cells = row.iter().skip(left).take(right.saturating_sub(left) + 1).cloned().collect();
                trim_row(cells)
            })
            .collect();

        while values.last().is_some_and(Vec::is_empty) {
            values.pop();
        }

        Ok(ValueRange {
            range: range.to_string(),
            values,
        })
    }

    async fn update_values(&self, range: &SheetRange, values: &[Row]) -> Result<(), TransportError> {
        let mut workbook = self.begin()?;
        workbook.write(range, values)
    }

    async fn append_values(&self, range: &SheetRange, values: &[Row]) -> Result<(), TransportError> {
        let mut workbook = self.begin()?;
        let grid = workbook.sheet_mut(range)?;
        let key_column = range.start.column;

        let next = grid
            .iter()
            .rposition(|row| row.get(key_column).is_some_and(|c| !c.is_blank()))
            .map_or(0, |last| last + 1);

        write_block(grid, next, key_column, values);
        Ok(())
    }

    async fn clear_values(&self, range: &SheetRange) -> Result<(), TransportError> {
        let mut workbook = self.begin()?;
        let grid = workbook.sheet_mut(range)?;

        let top = first_row(range);
        let bottom = last_row(range).unwrap_or(usize::MAX);
        let left = range.start.column;
        let right = range.end.column;

        for row in grid.iter_mut().skip(top).take(bottom.saturating_sub(top).saturating_add(1)) {
            for cell in row.iter_mut().skip(left).take(right.saturating_sub(left) + 1) {
                *cell = CellValue::Empty;
            }
        }
        Ok(())
    }

    async fn batch_update_values(&self, data: &[(SheetRange, Vec<Row>)]) -> Result<(), TransportError> {
        let mut workbook = self.begin()?;
        for (range, _) in data {
            workbook.sheet_index(range)?;
        }
        for (range, values) in data {
            workbook.write(range, values)?;
        }
        Ok(())
    }

    async fn add_sheet(&self, title: &str) -> Result<(), TransportError> {
        let mut workbook = self.begin()?;
        if workbook.sheets.iter().any(|(t, _)| t == title) {
            return Err(TransportError::http(
                400,
                format!(
                    "Invalid requests[0].addSheet: A sheet with the name \"{title}\" already exists. Please enter another name."
                ),
            ));
        }
        workbook.sheets.push((title.to_string(), Vec::new()));
        Ok(())
    }

    async fn sheet_titles(&self) -> Result<Vec<String>, TransportError> {
        let workbook = self.begin()?;
        Ok(workbook.sheets.iter().map(|(t, _)| t.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aturno_parser::parse_range;
    use pretty_assertions::assert_eq;

    fn range(s: &str) -> SheetRange {
        parse_range(s).unwrap()
    }

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| CellValue::text(*c)).collect()
    }

    #[tokio::test]
    async fn write_then_read_trims_trailing_blanks() {
        let t = MemoryTransport::with_sheets(["Tasks"]);
        t.update_values(&range("Tasks!A1:C2"), &[row(&["ID", "Name", ""]), row(&["t1", "x", ""])])
            .await
            .unwrap();

        let read = t.get_values(&range("Tasks!A:C")).await.unwrap();
        assert_eq!(read.values, vec![row(&["ID", "Name"]), row(&["t1", "x"])]);
    }

    #[tokio::test]
    async fn append_goes_after_last_occupied_key_cell() {
        let t = MemoryTransport::with_sheets(["Tasks"]);
        let a_col = range("Tasks!A:A");
        t.append_values(&a_col, &[row(&["ID"])]).await.unwrap();
        t.append_values(&a_col, &[row(&["t1"]), row(&["t2"])]).await.unwrap();
        t.clear_values(&range("Tasks!A2:B2")).await.unwrap();
        t.append_values(&a_col, &[row(&["t3"])]).await.unwrap();

        let read = t.get_values(&range("Tasks!A:A")).await.unwrap();
        assert_eq!(read.values, vec![row(&["ID"]), vec![], row(&["t2"]), row(&["t3"])]);
    }

    #[tokio::test]
    async fn clear_keeps_row_positions() {
        let t = MemoryTransport::with_sheets(["S"]);
        t.update_values(&range("S!A1:B3"), &[row(&["a", "b"]), row(&["c", "d"]), row(&["e", "f"])])
            .await
            .unwrap();
        t.clear_values(&range("S!A2:B2")).await.unwrap();

        let read = t.get_values(&range("S!A:B")).await.unwrap();
        assert_eq!(read.values, vec![row(&["a", "b"]), vec![], row(&["e", "f"])]);
    }

    #[tokio::test]
    async fn unknown_sheet_is_a_400() {
        let t = MemoryTransport::new();
        let err = t.get_values(&range("Nope!A:B")).await.unwrap_err();
        assert_eq!(err.status, Some(400));
        assert!(err.message.contains("Unable to parse range"));
    }

    #[tokio::test]
    async fn duplicate_sheet_is_rejected() {
        let t = MemoryTransport::new();
        t.add_sheet("Tasks").await.unwrap();
        assert!(t.add_sheet("Tasks").await.is_err());
        assert_eq!(t.sheet_titles().await.unwrap(), vec!["Tasks".to_string()]);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let t = MemoryTransport::with_sheets(["S"]);
        t.fail_next(2, TransportError::http(429, "Quota exceeded"));

        assert!(t.sheet_titles().await.is_err());
        assert!(t.sheet_titles().await.is_err());
        assert!(t.sheet_titles().await.is_ok());
        assert_eq!(t.calls(), 3);
    }
}
