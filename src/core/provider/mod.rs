//! Row sources
//!
//! A [`DataProvider`] is a forward-only, single-pass cursor over rows. Callers
//! must call [`DataProvider::next`] before every [`DataProvider::value`];
//! `next` only reports availability (it may fetch the next page) and `value`
//! hands out the current row and advances the read pointer.
//!
//! `next` receives the export's [`ExportContext`]. Paged sources race each
//! page fetch against it, so a shutdown signal or deadline interrupts a slow
//! query instead of waiting for it.
//!
//! Variants:
//! - [`SliceDataProvider`] - in-memory rows
//! - [`PageDataProvider`] - offset/limit paged query
//! - [`WatermarkDataProvider`] - paged by last seen id and timestamp
//! - [`SqlDataProvider`] - literal SQL wrapped in an offset/limit page
//! - [`JsonLinesDataProvider`] - line-delimited JSON read lazily

pub mod jsonl;
pub mod page;
pub mod slice;
pub mod sql;
pub mod watermark;

pub use jsonl::JsonLinesDataProvider;
pub use page::{FnPageQuery, PageCallback, PageDataProvider, PageQuery};
pub use slice::SliceDataProvider;
pub use sql::{paginate_sql, SqlDataProvider, SqlExecutor};
pub use watermark::{FnWatermarkQuery, WatermarkDataProvider, WatermarkQuery, WatermarkRecord};

use crate::core::export::ExportContext;
use crate::domain::RowValue;
use async_trait::async_trait;
use std::time::Duration;

/// Default rows fetched per page
pub const DEFAULT_PAGE_SIZE: usize = 2000;

/// Default bound on a single page fetch
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Forward-only row cursor
#[async_trait]
pub trait DataProvider: Send {
    /// Whether another row is available
    ///
    /// Paged sources fetch the next page here when the current one is
    /// exhausted. Once this returns `false` it returns `false` forever.
    /// A fetch interrupted by `ctx` also ends the source; the caller learns
    /// why from `ctx.check()`.
    async fn next(&mut self, ctx: &ExportContext) -> bool;

    /// Take the current row and advance
    ///
    /// Returns [`RowValue::Invalid`] when called without a successful `next`.
    fn value(&mut self) -> RowValue;

    /// Reason the source stopped early, if a fetch failed
    fn source_error(&self) -> Option<&str> {
        None
    }
}

#[async_trait]
impl<P: DataProvider + ?Sized> DataProvider for Box<P> {
    async fn next(&mut self, ctx: &ExportContext) -> bool {
        (**self).next(ctx).await
    }

    fn value(&mut self) -> RowValue {
        (**self).value()
    }

    fn source_error(&self) -> Option<&str> {
        (**self).source_error()
    }
}

/// Sources paged by a page size and a per-page query timeout
pub trait PagedSource: Sized {
    /// Apply both paging settings; zero keeps the respective default
    fn paged(self, page_size: usize, query_timeout: Duration) -> Self;
}
