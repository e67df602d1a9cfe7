//! Core export engine
//!
//! - [`columns`] - column model and row projector
//! - [`provider`] - pull-based row sources
//! - [`export`] - exporters, archive splitting and the storage bridge
//!
//! # Example
//!
//! ```rust,no_run
//! use tabex::core::export::{ExcelExporter, ExportContext, ExportOptions, Exporter};
//! use tabex::core::provider::SliceDataProvider;
//! use tabex::domain::Header;
//! use serde_json::json;
//!
//! # async fn example() -> tabex::domain::Result<()> {
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let ctx = ExportContext::background().with_shutdown(shutdown_rx);
//!
//! let rows = SliceDataProvider::new(vec![json!({"sku": "A-1", "qty": 3})]);
//! let headers = vec![Header::new("sku", "SKU"), Header::new("qty", "Quantity")];
//! let options = ExportOptions::new().filename("stock").row_start(1);
//!
//! let mut exporter = ExcelExporter::new(headers, rows, options)?;
//! let path = exporter.export(&ctx).await?;
//! println!("{}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod columns;
pub mod export;
pub mod provider;
