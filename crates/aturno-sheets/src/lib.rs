//! # aturno-sheets
//!
//! Client for a remote spreadsheet used as a table store.
//!
//! This crate provides:
//! - `SheetsClient`: range reads and writes, appends, clears, batch updates,
//!   sheet management and free-text search
//! - The `SheetsTransport` seam with a Google Sheets REST implementation and
//!   an in-memory implementation
//! - Error normalization (`SheetsError`, `ErrorKind`) and retry with backoff
//! - Connection settings loaded from the environment (`SheetsConfig`)
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use aturno_core::CellValue;
//! use aturno_sheets::{MemoryTransport, SheetsClient};
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let client = SheetsClient::new(Arc::new(MemoryTransport::with_sheets(["Notes"])), "local");
//! client
//!     .append_data("Notes", &[vec![CellValue::text("hello")]])
//!     .await
//!     .unwrap();
//!
//! let data = client.read_range("Notes!A:B").await.unwrap();
//! assert_eq!(data.values, vec![vec![CellValue::text("hello")]]);
//! # });
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod google;
pub mod memory;
pub mod retry;
pub mod transport;

pub use client::{RangeUpdate, SheetData, SheetsClient};
pub use config::{ConfigError, SheetsConfig};
pub use error::{classify, ErrorKind, SheetsError};
pub use google::GoogleSheetsTransport;
pub use memory::MemoryTransport;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use transport::{SheetsTransport, TransportError, ValueRange};

// Mapping types callers need alongside the client
pub use aturno_core::mapping::{ColumnMapping, HeaderMode, Record, Row};
