//! # aturno-store
//!
//! Entity services backed by spreadsheet tables.
//!
//! This crate provides:
//! - `SheetTable<E>`: full-scan CRUD over the sheet of any `SheetEntity`
//! - `TaskSheetService` and `ProjectSheetService`: per-entity queries,
//!   create/update/delete, search, sheet initialization and statistics
//! - `StoreError`: failures tagged with the operation that produced them
//!
//! Every call reads the whole sheet; there is no cache and no index.

pub mod error;
pub mod projects;
pub mod table;
pub mod tasks;

pub use error::StoreError;
pub use projects::ProjectSheetService;
pub use table::{SheetTable, Stored};
pub use tasks::TaskSheetService;
