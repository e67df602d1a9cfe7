//! Line-delimited JSON row source

use super::DataProvider;
use crate::core::export::ExportContext;
use crate::domain::{IntoRow, Result, RowValue};
use crate::domain::context::ResultExt;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

/// Reads one JSON value per line, lazily
///
/// Objects become mapping rows and arrays become list rows. Blank lines are
/// skipped. A malformed line or read error ends the source and is reported
/// through [`DataProvider::source_error`]. A read blocked on a slow input
/// (a pipe, for example) is abandoned once the context is cancelled.
pub struct JsonLinesDataProvider<R> {
    lines: Lines<BufReader<R>>,
    current: Option<Value>,
    line_no: usize,
    done: bool,
    error: Option<String>,
}

impl JsonLinesDataProvider<File> {
    /// Open a `.jsonl` file
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open input {}", path.display()))?;
        Ok(Self::new(file))
    }
}

impl<R: AsyncRead + Unpin + Send> JsonLinesDataProvider<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            current: None,
            line_no: 0,
            done: false,
            error: None,
        }
    }

    fn stop(&mut self, reason: String) {
        tracing::warn!(line = self.line_no, error = %reason, "Input stopped early");
        self.done = true;
        self.error = Some(reason);
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> DataProvider for JsonLinesDataProvider<R> {
    async fn next(&mut self, ctx: &ExportContext) -> bool {
        if self.current.is_some() {
            return true;
        }
        while !self.done {
            let line = tokio::select! {
                biased;
                reason = ctx.cancelled() => {
                    tracing::debug!(line = self.line_no, error = %reason, "Input read interrupted");
                    self.done = true;
                    return false;
                }
                line = self.lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) => {
                    self.line_no += 1;
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Value>(&line) {
                        Ok(value) => {
                            self.current = Some(value);
                            return true;
                        }
                        Err(e) => self.stop(format!("line {}: {e}", self.line_no)),
                    }
                }
                Ok(None) => self.done = true,
                Err(e) => self.stop(e.to_string()),
            }
        }
        false
    }

    fn value(&mut self) -> RowValue {
        self.current.take().into_row()
    }

    fn source_error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
