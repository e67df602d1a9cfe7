// Tabex - Bulk tabular export engine
// Copyright (c) 2025 Tabex Contributors
// Licensed under the MIT License

//! # Tabex - bulk tabular export
//!
//! Tabex turns a large, lazily produced stream of rows into CSV or XLSX
//! files. Output is capped per file and spills into a zip archive of
//! numbered chunks when it grows past the cap; the result can be kept on
//! disk, copied into any async writer or streamed straight into object
//! storage.
//!
//! ## Architecture
//!
//! - [`domain`] - errors, row values and column headers
//! - [`core`] - row sources, column projection and the exporters
//! - [`adapters`] - storage backends
//! - [`config`] - TOML configuration
//! - [`logging`] - tracing setup and logging macros
//! - [`cli`] - command-line interface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tabex::core::export::{CsvExporter, ExportContext, ExportOptions, Exporter};
//! use tabex::core::provider::{FnPageQuery, PageDataProvider};
//! use tabex::domain::Header;
//! use serde_json::{json, Value};
//!
//! # async fn example() -> tabex::domain::Result<()> {
//! // offset/limit pages from any backing store
//! let query = FnPageQuery::new(|offset: usize, limit: usize| async move {
//!     let rows: Vec<Value> = (offset..(offset + limit).min(250_000))
//!         .map(|id| json!({"id": id, "status": "active"}))
//!         .collect();
//!     Ok(rows)
//! });
//! let provider = PageDataProvider::new(query).with_limit(5000);
//!
//! let headers = vec![Header::new("id", "ID"), Header::new("status", "Status")];
//! let options = ExportOptions::new().filename("accounts");
//!
//! // 250k rows: a zip of three CSV chunks
//! let mut exporter = CsvExporter::new(headers, provider, options)?;
//! let path = exporter.export(&ExportContext::background()).await?;
//! println!("{}", path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::Result`], whose error is
//! [`domain::ExportError`]. Exceeding the row cap, cancellation and storage
//! failures each have their own variant.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
