//! Row pump shared by every exporter
//!
//! Pulls rows from the source, projects them and feeds an encoder until the
//! chunk cap, exhaustion, a limit breach or cancellation.

use super::context::ExportContext;
use super::options::ExportOptions;
use crate::core::columns::Columns;
use crate::core::provider::DataProvider;
use crate::domain::{ExportError, Headers, Result};
use serde_json::Value;

/// Format encoder for one chunk
pub trait RowEncoder {
    fn write_titles(&mut self, titles: &[String]) -> Result<()>;

    /// Write the `n`-th data row of the chunk (1-based)
    fn write_row(&mut self, n: usize, cells: Vec<Value>) -> Result<()>;

    fn finish(&mut self) -> Result<()>;

    /// Row number handed to render functions for the `n`-th data row
    fn render_row(&self, n: usize) -> usize {
        n
    }

    /// Offset added to the column number handed to render functions
    fn render_col_offset(&self) -> usize {
        0
    }
}

/// Result of one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub rows: usize,
    /// The chunk stopped at the per-file cap and the source has another row
    pub has_more: bool,
}

pub(crate) struct RowPump<P> {
    provider: P,
    columns: Columns,
    options: ExportOptions,
    total: usize,
}

impl<P: DataProvider> RowPump<P> {
    pub(crate) fn new(headers: Headers, provider: P, options: ExportOptions) -> Result<Self> {
        Ok(Self {
            provider,
            columns: Columns::new(headers)?,
            options,
            total: 0,
        })
    }

    pub(crate) fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub(crate) fn total(&self) -> usize {
        self.total
    }

    /// Write titles and rows into `encoder`
    ///
    /// When the chunk reaches the per-file cap, `next` is called once more so
    /// that `has_more` is only reported when a further row exists.
    pub(crate) async fn write_chunk(
        &mut self,
        ctx: &ExportContext,
        encoder: &mut (dyn RowEncoder + Send),
    ) -> Result<ChunkOutcome> {
        ctx.check()?;
        encoder.write_titles(self.columns.titles())?;

        let limit = self.options.chunk_limit();
        let max_rows = self.options.get_max_rows();
        let mut rows = 0;
        let mut has_more = false;

        while self.provider.next(ctx).await {
            let row = self.provider.value();
            rows += 1;

            let cells = self.columns.project(
                &row,
                encoder.render_row(rows),
                encoder.render_col_offset(),
            );
            encoder.write_row(rows, cells)?;

            self.total += 1;
            if self.total > max_rows {
                return Err(ExportError::MaximumLimit { limit: max_rows });
            }
            ctx.check()?;

            if limit.is_some_and(|cap| rows >= cap) {
                has_more = self.provider.next(ctx).await;
                break;
            }
        }

        // a source interrupted mid-fetch ends like an exhausted one
        ctx.check()?;
        encoder.finish()?;

        if !has_more && self.options.is_fail_on_source_error() {
            if let Some(reason) = self.provider.source_error() {
                return Err(ExportError::SourceFailed(reason.to_string()));
            }
        }

        Ok(ChunkOutcome { rows, has_more })
    }
}
