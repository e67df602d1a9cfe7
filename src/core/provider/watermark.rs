//! Watermark-paged row source
//!
//! Pages are keyed by the id and timestamp of the last record seen rather
//! than an offset, so rows appended while the export runs are neither skipped
//! nor repeated. The backing query must return records in non-decreasing
//! `(id, ts)` order; this is not checked.

use super::page::{PageCallback, PageCursor};
use super::{DataProvider, PagedSource, SliceDataProvider};
use crate::core::export::ExportContext;
use crate::domain::{IntoRow, Record, Result, RowValue};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

/// A record that carries its own watermark
pub trait WatermarkRecord {
    fn watermark_id(&self) -> i64;
    fn watermark_ts(&self) -> i64;
}

fn field_i64(map: &Map<String, Value>, key: &str) -> i64 {
    map.get(key).and_then(Value::as_i64).unwrap_or_default()
}

impl WatermarkRecord for Map<String, Value> {
    fn watermark_id(&self) -> i64 {
        field_i64(self, "id")
    }

    fn watermark_ts(&self) -> i64 {
        field_i64(self, "ts")
    }
}

impl WatermarkRecord for Value {
    fn watermark_id(&self) -> i64 {
        self.get("id").and_then(Value::as_i64).unwrap_or_default()
    }

    fn watermark_ts(&self) -> i64 {
        self.get("ts").and_then(Value::as_i64).unwrap_or_default()
    }
}

impl WatermarkRecord for Record {
    fn watermark_id(&self) -> i64 {
        member_i64(self, "id")
    }

    fn watermark_ts(&self) -> i64 {
        member_i64(self, "ts")
    }
}

fn member_i64(record: &Record, key: &str) -> i64 {
    record
        .members()
        .iter()
        .find(|m| m.key() == key)
        .and_then(|m| m.value().as_i64())
        .unwrap_or_default()
}

/// Backing query of a [`WatermarkDataProvider`]
#[async_trait]
pub trait WatermarkQuery: Send + Sync {
    type Item: WatermarkRecord + Send;

    /// Fetch up to `limit` records strictly after `(last_id, last_ts)`
    ///
    /// The returned future is dropped if `ctx` is cancelled first.
    async fn fetch(
        &self,
        ctx: &ExportContext,
        last_id: i64,
        last_ts: i64,
        limit: usize,
    ) -> Result<Vec<Self::Item>>;
}

/// Adapts an async closure `(last_id, last_ts, limit) -> Result<Vec<T>>`
pub struct FnWatermarkQuery<F, T> {
    f: F,
    _item: PhantomData<fn() -> T>,
}

impl<F, Fut, T> FnWatermarkQuery<F, T>
where
    F: Fn(i64, i64, usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<F, Fut, T> WatermarkQuery for FnWatermarkQuery<F, T>
where
    F: Fn(i64, i64, usize) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>>> + Send,
    T: WatermarkRecord + Send,
{
    type Item = T;

    async fn fetch(
        &self,
        _ctx: &ExportContext,
        last_id: i64,
        last_ts: i64,
        limit: usize,
    ) -> Result<Vec<T>> {
        (self.f)(last_id, last_ts, limit).await
    }
}

/// Row source paged by last seen id and timestamp
pub struct WatermarkDataProvider<Q: WatermarkQuery> {
    query: Q,
    last_id: i64,
    last_ts: i64,
    cursor: PageCursor,
    callback: PageCallback<Q::Item>,
}

impl<Q> WatermarkDataProvider<Q>
where
    Q: WatermarkQuery,
    Q::Item: IntoRow + 'static,
{
    pub fn new(query: Q) -> Self {
        Self::with_converter(
            query,
            Box::new(|items: Vec<Q::Item>| {
                items.into_iter().map(IntoRow::into_row).collect()
            }),
        )
    }
}

impl<Q: WatermarkQuery> WatermarkDataProvider<Q> {
    /// Create a source whose pages are converted by `callback`
    pub fn with_converter(query: Q, callback: PageCallback<Q::Item>) -> Self {
        Self {
            query,
            last_id: 0,
            last_ts: 0,
            cursor: PageCursor::new(),
            callback,
        }
    }

    /// Resume after a previously exported watermark
    pub fn starting_after(mut self, last_id: i64, last_ts: i64) -> Self {
        self.last_id = last_id;
        self.last_ts = last_ts;
        self
    }

    /// Page size; zero keeps the default
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.cursor.set_limit(limit);
        self
    }

    /// Bound on a single page fetch; zero keeps the default
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.cursor.set_query_timeout(timeout);
        self
    }

    /// Replace the page conversion
    ///
    /// The watermark is still read from the raw page before `callback` runs.
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(Vec<Q::Item>) -> Vec<RowValue> + Send + Sync + 'static,
    {
        self.callback = Box::new(callback);
        self
    }

    /// Current `(last_id, last_ts)` watermark
    pub fn watermark(&self) -> (i64, i64) {
        (self.last_id, self.last_ts)
    }
}

#[async_trait]
impl<Q: WatermarkQuery> DataProvider for WatermarkDataProvider<Q> {
    async fn next(&mut self, ctx: &ExportContext) -> bool {
        loop {
            if !self.cursor.has_more {
                return false;
            }
            if self.cursor.buffer.has_next() {
                return true;
            }

            let fetch = self
                .query
                .fetch(ctx, self.last_id, self.last_ts, self.cursor.limit);
            let Some(items) = self.cursor.fetch(ctx, fetch).await else {
                continue;
            };
            if let Some(last) = items.last() {
                self.last_id = last.watermark_id();
                self.last_ts = last.watermark_ts();
            }

            tracing::debug!(
                last_id = self.last_id,
                last_ts = self.last_ts,
                fetched = items.len(),
                "Fetched watermark page"
            );
            self.cursor.buffer = SliceDataProvider::from_rows((self.callback)(items));
        }
    }

    fn value(&mut self) -> RowValue {
        self.cursor.buffer.take()
    }

    fn source_error(&self) -> Option<&str> {
        self.cursor.error.as_deref()
    }
}

impl<Q: WatermarkQuery> PagedSource for WatermarkDataProvider<Q> {
    fn paged(self, page_size: usize, query_timeout: Duration) -> Self {
        self.with_limit(page_size).with_query_timeout(query_timeout)
    }
}
