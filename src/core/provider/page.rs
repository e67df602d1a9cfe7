//! Offset-paged row source

use super::{DataProvider, PagedSource, SliceDataProvider, DEFAULT_PAGE_SIZE, DEFAULT_QUERY_TIMEOUT};
use crate::core::export::ExportContext;
use crate::domain::{IntoRow, Result, RowValue};
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

/// Batch transform applied to each fetched page before iteration
pub type PageCallback<T> = Box<dyn Fn(Vec<T>) -> Vec<RowValue> + Send + Sync>;

/// Backing query of a [`PageDataProvider`]
#[async_trait]
pub trait PageQuery: Send + Sync {
    type Item: Send;

    /// Fetch up to `limit` records starting at `offset`
    ///
    /// The returned future is dropped if `ctx` is cancelled first.
    async fn fetch(&self, ctx: &ExportContext, offset: usize, limit: usize)
        -> Result<Vec<Self::Item>>;
}

/// Adapts an async closure `(offset, limit) -> Result<Vec<T>>` into a [`PageQuery`]
///
/// The closure never sees the context; cancellation drops its future.
pub struct FnPageQuery<F, T> {
    f: F,
    _item: PhantomData<fn() -> T>,
}

impl<F, Fut, T> FnPageQuery<F, T>
where
    F: Fn(usize, usize) -> Fut,
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
impl<F, Fut, T> PageQuery for FnPageQuery<F, T>
where
    F: Fn(usize, usize) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>>> + Send,
    T: Send,
{
    type Item = T;

    async fn fetch(&self, _ctx: &ExportContext, offset: usize, limit: usize) -> Result<Vec<T>> {
        (self.f)(offset, limit).await
    }
}

/// Refill bookkeeping shared by the paged sources
#[derive(Debug)]
pub(crate) struct PageCursor {
    pub(crate) buffer: SliceDataProvider,
    pub(crate) has_more: bool,
    pub(crate) limit: usize,
    pub(crate) query_timeout: Duration,
    pub(crate) error: Option<String>,
}

impl PageCursor {
    pub(crate) fn new() -> Self {
        Self {
            buffer: SliceDataProvider::default(),
            has_more: true,
            limit: DEFAULT_PAGE_SIZE,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            error: None,
        }
    }

    pub(crate) fn set_limit(&mut self, limit: usize) {
        if limit > 0 {
            self.limit = limit;
        }
    }

    pub(crate) fn set_query_timeout(&mut self, timeout: Duration) {
        if !timeout.is_zero() {
            self.query_timeout = timeout;
        }
    }

    /// Run one page fetch under the query timeout, racing `ctx`
    ///
    /// Returns `None` and ends the source on timeout, error, an empty page or
    /// cancellation. Cancellation is not recorded as a source error.
    pub(crate) async fn fetch<T, F>(&mut self, ctx: &ExportContext, fetch: F) -> Option<Vec<T>>
    where
        F: Future<Output = Result<Vec<T>>>,
    {
        let timed = tokio::time::timeout(self.query_timeout, fetch);
        let outcome = tokio::select! {
            biased;
            reason = ctx.cancelled() => {
                tracing::debug!(error = %reason, "Page query interrupted");
                self.has_more = false;
                return None;
            }
            outcome = timed => outcome,
        };

        match outcome {
            Err(_) => {
                self.stop(format!(
                    "page query timed out after {:?}",
                    self.query_timeout
                ));
                None
            }
            Ok(Err(e)) => {
                self.stop(e.to_string());
                None
            }
            Ok(Ok(items)) if items.is_empty() => {
                tracing::debug!("Row source exhausted");
                self.has_more = false;
                None
            }
            Ok(Ok(items)) => Some(items),
        }
    }

    fn stop(&mut self, reason: String) {
        tracing::warn!(error = %reason, "Row source stopped early");
        self.has_more = false;
        self.error = Some(reason);
    }
}

/// Row source paged by offset and limit
///
/// # Examples
///
/// ```rust,no_run
/// use tabex::core::provider::{DataProvider, FnPageQuery, PageDataProvider};
/// use serde_json::{json, Value};
///
/// # async fn example() {
/// use tabex::core::export::ExportContext;
///
/// let ctx = ExportContext::background();
/// let query = FnPageQuery::new(|offset: usize, limit: usize| async move {
///     Ok::<_, tabex::domain::ExportError>(
///         (offset..(offset + limit).min(10)).map(|i| json!({"id": i})).collect::<Vec<Value>>(),
///     )
/// });
/// let mut dp = PageDataProvider::new(query).with_limit(4);
/// while dp.next(&ctx).await {
///     let _row = dp.value();
/// }
/// # }
/// ```
pub struct PageDataProvider<Q: PageQuery> {
    query: Q,
    offset: usize,
    cursor: PageCursor,
    callback: PageCallback<Q::Item>,
}

impl<Q> PageDataProvider<Q>
where
    Q: PageQuery,
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

impl<Q: PageQuery> PageDataProvider<Q> {
    /// Create a source whose pages are converted by `callback`
    pub fn with_converter(query: Q, callback: PageCallback<Q::Item>) -> Self {
        Self {
            query,
            offset: 0,
            cursor: PageCursor::new(),
            callback,
        }
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
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(Vec<Q::Item>) -> Vec<RowValue> + Send + Sync + 'static,
    {
        self.callback = Box::new(callback);
        self
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.cursor.limit
    }
}

#[async_trait]
impl<Q: PageQuery> DataProvider for PageDataProvider<Q> {
    async fn next(&mut self, ctx: &ExportContext) -> bool {
        loop {
            if !self.cursor.has_more {
                return false;
            }
            if self.cursor.buffer.has_next() {
                return true;
            }

            let fetch = self.query.fetch(ctx, self.offset, self.cursor.limit);
            let Some(items) = self.cursor.fetch(ctx, fetch).await else {
                continue;
            };
            self.offset += self.cursor.limit;

            tracing::debug!(
                offset = self.offset,
                fetched = items.len(),
                "Fetched page"
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

impl<Q: PageQuery> PagedSource for PageDataProvider<Q> {
    fn paged(self, page_size: usize, query_timeout: Duration) -> Self {
        self.with_limit(page_size).with_query_timeout(query_timeout)
    }
}
