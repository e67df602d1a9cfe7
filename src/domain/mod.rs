//! Domain models and types for tabex.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Row values** ([`RowValue`], [`Record`], [`IntoRow`]) describing the three row shapes
//! - **Header specification** ([`Header`], [`Headers`], [`CellRender`], [`ColumnStyle`])
//! - **Error types** ([`ExportError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ExportError>`]:
//!
//! ```rust
//! use tabex::domain::{ExportError, Result};
//!
//! fn check(rows: usize, limit: usize) -> Result<()> {
//!     if rows > limit {
//!         return Err(ExportError::MaximumLimit { limit });
//!     }
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod errors;
pub mod header;
pub mod result;
pub mod row;

// Re-export commonly used types for convenience
pub use errors::ExportError;
pub use header::{CellRender, ColumnStyle, Header, Headers};
pub use result::Result;
pub use row::{IntoRow, Member, Record, RowValue};
