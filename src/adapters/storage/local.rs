//! Filesystem-backed storage
//!
//! Objects are written below a root directory and published under a public
//! endpoint, e.g. a directory served by a static file server.

use super::{ByteStream, FileStorage};
use crate::config::StorageConfig;
use crate::core::export::ExportContext;
use crate::domain::context::ResultExt;
use crate::domain::{ExportError, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const COPY_BUFFER: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    endpoint: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, endpoint: &str) -> Self {
        Self {
            root: root.into(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.root, &config.endpoint)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `key` below the root, refusing keys that escape it
    fn full_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || key.trim().is_empty() {
            return Err(ExportError::Storage(format!("invalid object key: {key:?}")));
        }
        Ok(self.root.join(relative))
    }

    async fn copy_into(
        ctx: &ExportContext,
        path: &Path,
        reader: &mut ByteStream,
    ) -> Result<u64> {
        let mut file = tokio::fs::File::create(path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut buf = vec![0u8; COPY_BUFFER];
        let mut written = 0u64;
        loop {
            ctx.check()?;
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await?;
            written += n as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn put_stream(&self, ctx: &ExportContext, key: &str, mut reader: ByteStream) -> Result<()> {
        let path = self.full_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        match Self::copy_into(ctx, &path, &mut reader).await {
            Ok(bytes) => {
                tracing::debug!(path = %path.display(), bytes, "Stored object");
                Ok(())
            }
            Err(e) => {
                crate::core::export::file::remove_quietly(&path).await;
                Err(e)
            }
        }
    }

    fn url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint,
            key.replace('\\', "/").trim_start_matches('/')
        )
    }
}
