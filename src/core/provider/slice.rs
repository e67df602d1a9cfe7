//! In-memory row source

use super::DataProvider;
use crate::core::export::ExportContext;
use crate::domain::{IntoRow, RowValue};
use async_trait::async_trait;

/// Cursor over a fixed sequence of rows
///
/// Also serves as the page buffer of the paged sources.
#[derive(Debug, Default)]
pub struct SliceDataProvider {
    rows: Vec<RowValue>,
    index: usize,
}

impl SliceDataProvider {
    /// Resolve every row's shape up front
    pub fn new<T, I>(rows: I) -> Self
    where
        T: IntoRow,
        I: IntoIterator<Item = T>,
    {
        Self::from_rows(rows.into_iter().map(IntoRow::into_row).collect())
    }

    pub fn from_rows(rows: Vec<RowValue>) -> Self {
        Self { rows, index: 0 }
    }

    /// Synchronous availability check
    pub fn has_next(&self) -> bool {
        self.index < self.rows.len()
    }

    pub fn take(&mut self) -> RowValue {
        let row = self
            .rows
            .get_mut(self.index)
            .map(std::mem::take)
            .unwrap_or_default();
        // the pointer advances even past the end
        self.index = self.index.saturating_add(1);
        row
    }
}

#[async_trait]
impl DataProvider for SliceDataProvider {
    async fn next(&mut self, _ctx: &ExportContext) -> bool {
        self.has_next()
    }

    fn value(&mut self) -> RowValue {
        self.take()
    }
}
