//! Raw SQL row source
//!
//! A literal `SELECT` is wrapped in a derived table and paged with
//! `LIMIT`/`OFFSET`, so any executor that can run a query string and return
//! rows as JSON objects can back an export.

use super::page::{PageDataProvider, PageQuery};
use super::{DataProvider, PagedSource};
use crate::core::export::ExportContext;
use crate::domain::{Result, RowValue};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Executes a query string and returns rows keyed by column name
///
/// `ctx` belongs to the running export; drivers that support it can use it to
/// cancel server-side work. The pending query is dropped once `ctx` fires.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn query(&self, ctx: &ExportContext, sql: &str) -> Result<Vec<Map<String, Value>>>;
}

#[async_trait]
impl<E: SqlExecutor + ?Sized> SqlExecutor for Arc<E> {
    async fn query(&self, ctx: &ExportContext, sql: &str) -> Result<Vec<Map<String, Value>>> {
        (**self).query(ctx, sql).await
    }
}

/// Wrap `sql` into one page of `limit` rows starting at `offset`
pub fn paginate_sql(sql: &str, limit: usize, offset: usize) -> String {
    let inner = sql.trim().trim_end_matches(';').trim_end();
    format!("SELECT * FROM ({inner}) AS export_page LIMIT {limit} OFFSET {offset}")
}

struct RawQuery<E> {
    executor: E,
    sql: String,
}

#[async_trait]
impl<E: SqlExecutor> PageQuery for RawQuery<E> {
    type Item = Map<String, Value>;

    async fn fetch(
        &self,
        ctx: &ExportContext,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Self::Item>> {
        let sql = paginate_sql(&self.sql, limit, offset);
        tracing::trace!(sql = %sql, "Executing page query");
        self.executor.query(ctx, &sql).await
    }
}

/// Row source over a literal SQL query
pub struct SqlDataProvider<E: SqlExecutor> {
    inner: PageDataProvider<RawQuery<E>>,
}

impl<E: SqlExecutor> SqlDataProvider<E> {
    pub fn new(executor: E, sql: impl Into<String>) -> Self {
        Self {
            inner: PageDataProvider::new(RawQuery {
                executor,
                sql: sql.into(),
            }),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.inner = self.inner.with_limit(limit);
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_query_timeout(timeout);
        self
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(Vec<Map<String, Value>>) -> Vec<RowValue> + Send + Sync + 'static,
    {
        self.inner = self.inner.with_callback(callback);
        self
    }
}

#[async_trait]
impl<E: SqlExecutor> DataProvider for SqlDataProvider<E> {
    async fn next(&mut self, ctx: &ExportContext) -> bool {
        self.inner.next(ctx).await
    }

    fn value(&mut self) -> RowValue {
        self.inner.value()
    }

    fn source_error(&self) -> Option<&str> {
        self.inner.source_error()
    }
}

impl<E: SqlExecutor> PagedSource for SqlDataProvider<E> {
    fn paged(mut self, page_size: usize, query_timeout: Duration) -> Self {
        self.inner = self.inner.paged(page_size, query_timeout);
        self
    }
}
