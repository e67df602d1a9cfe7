//! Export orchestration
//!
//! Exporters pull rows from a [`DataProvider`](crate::core::provider::DataProvider),
//! project them through the column model and write them into CSV or XLSX
//! chunks. A chunk reaching the per-file cap spills the export into a zip
//! archive of sequentially numbered chunks.
//!
//! - [`CsvExporter`] / [`ExcelExporter`] - format-specific write loops
//! - [`Exporter`] - terminal operations (local file, writer, storage)
//! - [`ArchivePackager`] - zip container for split output
//! - [`stream_to_storage`] - pipe bridge into [`FileStorage`](crate::adapters::storage::FileStorage)

pub mod archive;
pub mod bridge;
pub mod context;
pub mod csv;
pub mod excel;
pub mod exporter;
pub mod file;
pub mod options;
pub mod pump;

pub use archive::ArchivePackager;
pub use bridge::{stream_to_storage, PIPE_CAPACITY};
pub use context::ExportContext;
pub use csv::{CsvEncoder, CsvExporter};
pub use excel::{ColumnLayout, ExcelEncoder, ExcelExporter};
pub use exporter::Exporter;
pub use file::{ChunkNamer, ExcelFile, ExportFile, TmpFile};
pub use options::{
    ExportOptions, CSV_SUFFIX, EXCEL_SUFFIX, MAX_ROWS, SINGLE_FILE_MAX_ROWS, ZIP_SUFFIX,
};
pub use pump::{ChunkOutcome, RowEncoder};
