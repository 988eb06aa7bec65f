//! Full-scan table over one sheet.
//!
//! A sheet holds one header row followed by one entity per row. There is no
//! index: every lookup reads the whole sheet, and an entity is addressed by
//! the physical row it was found on.

use std::fmt;
use std::marker::PhantomData;

use aturno_core::mapping::{records_to_rows, rows_to_records};
use aturno_core::{HeaderMode, SheetEntity};
use aturno_parser::column_letter;
use aturno_sheets::{SheetsClient, SheetsError};
use serde_json::json;
use tracing::{debug, info};

/// An entity together with the sheet row it occupies (1-based)
#[derive(Clone, Debug, PartialEq)]
pub struct Stored<E> {
    pub row: u32,
    pub entity: E,
}

/// Generic CRUD over the sheet of `E`
pub struct SheetTable<E> {
    client: SheetsClient,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for SheetTable<E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: SheetEntity> fmt::Debug for SheetTable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetTable")
            .field("sheet", &E::SHEET_NAME)
            .field("client", &self.client)
            .finish()
    }
}

impl<E: SheetEntity> SheetTable<E> {
    pub fn new(client: SheetsClient) -> Self {
        Self {
            client,
            _entity: PhantomData,
        }
    }

    pub fn client(&self) -> &SheetsClient {
        &self.client
    }

    fn last_column() -> String {
        column_letter(E::columns().len().saturating_sub(1))
    }

    /// `<sheet>!A:<last>`
    pub fn full_range() -> String {
        format!("{}!A:{}", E::SHEET_NAME, Self::last_column())
    }

    /// `<sheet>!A<row>:<last><row>`
    pub fn row_range(row: u32) -> String {
        let last = Self::last_column();
        format!("{}!A{row}:{last}{row}", E::SHEET_NAME)
    }

    /// Every entity with its row, in sheet order. Blank rows and rows
    /// without an id are skipped.
    pub async fn load(&self) -> Result<Vec<Stored<E>>, SheetsError> {
        let data = self.client.read_range(&Self::full_range()).await?;
        let Some(header) = data.values.first() else {
            return Ok(Vec::new());
        };

        let mapping = E::columns();
        mapping.check_header_row(header).map_err(|e| {
            SheetsError::validation(format!("{} sheet: {e}", E::SHEET_NAME))
                .with_details(json!({ "row": 1 }))
        })?;

        let records = rows_to_records(&data.values, mapping, HeaderMode::FirstRow);
        let mut stored = Vec::with_capacity(records.len());
        for (offset, record) in records.iter().enumerate() {
            let row = u32::try_from(offset + 2).unwrap_or(u32::MAX);
            let decoded = E::from_record(record).map_err(|e| {
                SheetsError::validation(format!("{} sheet row {row}: {e}", E::SHEET_NAME))
                    .with_details(json!({ "row": row }))
            })?;
            if let Some(entity) = decoded {
                stored.push(Stored { row, entity });
            }
        }

        debug!(sheet = E::SHEET_NAME, count = stored.len(), "Loaded table");
        Ok(stored)
    }

    pub async fn get_all(&self) -> Result<Vec<E>, SheetsError> {
        Ok(self.load().await?.into_iter().map(|s| s.entity).collect())
    }

    /// First entity with the given id
    pub async fn find(&self, id: &str) -> Result<Option<Stored<E>>, SheetsError> {
        Ok(self.load().await?.into_iter().find(|s| s.entity.id() == id))
    }

    /// Like [`SheetTable::find`], failing with not-found when absent
    pub async fn require(&self, id: &str) -> Result<Stored<E>, SheetsError> {
        self.find(id)
            .await?
            .ok_or_else(|| SheetsError::not_found(E::ENTITY_NAME, id))
    }

    /// Append one entity at the end of the table
    pub async fn insert(&self, entity: &E) -> Result<(), SheetsError> {
        let rows = records_to_rows(&[entity.to_record()], E::columns(), false);
        self.client.append_data(E::SHEET_NAME, &rows).await
    }

    /// Overwrite the whole row of an entity
    pub async fn overwrite(&self, row: u32, entity: &E) -> Result<(), SheetsError> {
        let rows = records_to_rows(&[entity.to_record()], E::columns(), false);
        self.client.write_range(&Self::row_range(row), &rows).await
    }

    /// Blank a row; the position stays as an empty placeholder
    pub async fn clear(&self, row: u32) -> Result<(), SheetsError> {
        self.client.clear_range(&Self::row_range(row)).await
    }

    /// Entities with any field containing `term`, ignoring case
    pub async fn search(&self, term: &str) -> Result<Vec<E>, SheetsError> {
        let records = self
            .client
            .search_in_sheet(E::SHEET_NAME, term, Some(E::columns()))
            .await?;

        let mut found = Vec::with_capacity(records.len());
        for record in &records {
            let decoded = E::from_record(record)
                .map_err(|e| SheetsError::validation(format!("{} sheet: {e}", E::SHEET_NAME)))?;
            found.extend(decoded);
        }
        Ok(found)
    }

    /// Create the sheet if missing, then write the header row if row 1 is
    /// empty. Safe to repeat; concurrent first runs may race.
    pub async fn initialize(&self) -> Result<(), SheetsError> {
        let names = self.client.get_sheet_names().await?;
        if !names.iter().any(|name| name == E::SHEET_NAME) {
            info!(sheet = E::SHEET_NAME, "Creating sheet");
            self.client.create_sheet(E::SHEET_NAME).await?;
        }

        let header_range = Self::row_range(1);
        let existing = self.client.read_range(&header_range).await?;
        if existing.values.is_empty() {
            info!(sheet = E::SHEET_NAME, "Writing header row");
            self.client
                .write_range(&header_range, &[E::columns().header_row()])
                .await?;
        }
        Ok(())
    }
}
