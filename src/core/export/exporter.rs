//! Terminal export operations shared by every format

use super::bridge::stream_to_storage;
use super::context::ExportContext;
use super::file::{entry_name_of, ExportFile};
use crate::adapters::storage::FileStorage;
use crate::domain::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWrite;

/// A format-specific exporter
///
/// The row source is single-pass, so each exporter instance produces one
/// artifact; a second call sees an exhausted source.
#[async_trait]
pub trait Exporter: Send {
    /// Run the write loop and return the finished artifact
    async fn build(&mut self, ctx: &ExportContext) -> Result<Box<dyn ExportFile>>;

    /// Export to a local file and return its path
    async fn export(&mut self, ctx: &ExportContext) -> Result<PathBuf> {
        let file = self.build(ctx).await?;
        file.save().await
    }

    /// Export into `w` and return the number of bytes written
    ///
    /// Temporary files are removed afterwards.
    async fn export_to(
        &mut self,
        ctx: &ExportContext,
        w: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let mut file = self.build(ctx).await?;
        let result = file.write_to(w).await;
        file.discard().await;
        result
    }

    /// Export to `storage` under the artifact's file name and return its URL
    async fn export_to_storage(
        &mut self,
        ctx: &ExportContext,
        storage: &dyn FileStorage,
    ) -> Result<String> {
        let mut file = self.build(ctx).await?;
        let key = entry_name_of(file.file_path());
        let result = stream_to_storage(ctx, file.as_mut(), storage, &key).await;
        file.discard().await;
        result
    }

    /// Export to `storage` under an explicit `key`
    async fn export_to_storage_as(
        &mut self,
        ctx: &ExportContext,
        storage: &dyn FileStorage,
        key: &str,
    ) -> Result<String> {
        let mut file = self.build(ctx).await?;
        let result = stream_to_storage(ctx, file.as_mut(), storage, key).await;
        file.discard().await;
        result
    }
}
