//! Storage streaming bridge
//!
//! A producer copies the finished artifact into an in-process pipe while a
//! consumer streams the other end to a [`FileStorage`]. Both halves are
//! joined; the first failure observed is returned and a later one is logged.

use super::context::ExportContext;
use super::file::ExportFile;
use crate::adapters::storage::FileStorage;
use crate::domain::{ExportError, Result};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWriteExt, DuplexStream, ReadBuf};

/// Bytes buffered in the pipe before the producer waits for the consumer
pub const PIPE_CAPACITY: usize = 64 * 1024;

const NO_FAILURE: u8 = 0;
const PRODUCER: u8 = 1;
const CONSUMER: u8 = 2;

/// Consumer end that turns a producer failure into a read error
///
/// A plain pipe would report clean end-of-stream once the producer drops its
/// half, letting storage persist a truncated object.
struct PipeReader {
    inner: DuplexStream,
    producer_failed: Arc<AtomicBool>,
}

impl AsyncRead for PipeReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(Ok(()))
                if buf.remaining() > 0
                    && buf.filled().len() == before
                    && this.producer_failed.load(Ordering::Acquire) =>
            {
                Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "export artifact producer failed",
                )))
            }
            other => other,
        }
    }
}

fn mark(first: &AtomicU8, side: u8) {
    let _ = first.compare_exchange(NO_FAILURE, side, Ordering::AcqRel, Ordering::Acquire);
}

/// Stream `file` to `storage` under `key` and return the published URL
pub async fn stream_to_storage(
    ctx: &ExportContext,
    file: &mut dyn ExportFile,
    storage: &dyn FileStorage,
    key: &str,
) -> Result<String> {
    ctx.check()?;

    let (writer, reader) = tokio::io::duplex(PIPE_CAPACITY);
    let producer_failed = Arc::new(AtomicBool::new(false));
    let first = AtomicU8::new(NO_FAILURE);
    let reader = PipeReader {
        inner: reader,
        producer_failed: producer_failed.clone(),
    };

    let produce = async {
        let mut writer = writer;
        let result = file.write_to(&mut writer).await;
        if result.is_err() {
            producer_failed.store(true, Ordering::Release);
            mark(&first, PRODUCER);
        }
        if let Err(e) = writer.shutdown().await {
            tracing::debug!(error = %e, "Pipe writer already closed");
        }
        result
    };

    let consume = async {
        let result = storage.put_stream(ctx, key, Box::new(reader)).await;
        if result.is_err() {
            mark(&first, CONSUMER);
        }
        result
    };

    let (produced, consumed) = tokio::join!(produce, consume);

    match (produced, consumed) {
        (Ok(bytes), Ok(())) => {
            tracing::info!(key = %key, bytes, "Uploaded export to storage");
            Ok(storage.url(key))
        }
        (Err(e), Ok(())) | (Ok(_), Err(e)) => {
            tracing::error!(key = %key, error = %e, "Storage upload failed");
            Err(e)
        }
        (Err(p), Err(c)) => {
            let (primary, secondary): (ExportError, ExportError) =
                if first.load(Ordering::Acquire) == CONSUMER {
                    (c, p)
                } else {
                    (p, c)
                };
            tracing::warn!(key = %key, error = %secondary, "Secondary upload failure");
            tracing::error!(key = %key, error = %primary, "Storage upload failed");
            Err(primary)
        }
    }
}
