//! Batch ingestion from spreadsheet-style CSV, plus the display-only cap
//! table.

pub mod caps;
pub mod sheet;
pub mod source;

pub use caps::CapTable;
pub use sheet::{read_batch, ColumnLayout, DropReason, IngestReport};
pub use source::{BatchSource, CsvFileSource, MemorySource};
