//! Temporary output sinks and chunk naming

use crate::domain::context::ResultExt;
use crate::domain::Result;
use async_trait::async_trait;
use chrono::Local;
use rand::Rng;
use rust_xlsxwriter::Workbook;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// A finished export artifact
///
/// Owned by the exporter that produced it until handed to the caller.
#[async_trait]
pub trait ExportFile: Send {
    /// Local path of the artifact
    fn file_path(&self) -> &Path;

    /// Copy the whole artifact into `w`, from its start
    async fn write_to(&mut self, w: &mut (dyn AsyncWrite + Unpin + Send)) -> Result<u64>;

    /// Make sure the artifact exists at [`file_path`](Self::file_path)
    async fn save(self: Box<Self>) -> Result<PathBuf>;

    /// Remove whatever the artifact left on disk
    async fn discard(self: Box<Self>);
}

/// Artifact already written to a local file
#[derive(Debug)]
pub struct TmpFile {
    path: PathBuf,
}

impl TmpFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ExportFile for TmpFile {
    fn file_path(&self) -> &Path {
        &self.path
    }

    async fn write_to(&mut self, w: &mut (dyn AsyncWrite + Unpin + Send)) -> Result<u64> {
        let mut file = tokio::fs::File::open(&self.path)
            .await
            .with_context(|| format!("Failed to reopen {}", self.path.display()))?;
        let written = tokio::io::copy(&mut file, w).await?;
        w.flush().await?;
        Ok(written)
    }

    async fn save(self: Box<Self>) -> Result<PathBuf> {
        Ok(self.path)
    }

    async fn discard(self: Box<Self>) {
        remove_quietly(&self.path).await;
    }
}

/// Spreadsheet held in memory until saved or streamed
pub struct ExcelFile {
    path: PathBuf,
    workbook: Workbook,
}

impl ExcelFile {
    pub fn new(path: impl Into<PathBuf>, workbook: Workbook) -> Self {
        Self {
            path: path.into(),
            workbook,
        }
    }
}

#[async_trait]
impl ExportFile for ExcelFile {
    fn file_path(&self) -> &Path {
        &self.path
    }

    async fn write_to(&mut self, w: &mut (dyn AsyncWrite + Unpin + Send)) -> Result<u64> {
        let bytes = self.workbook.save_to_buffer()?;
        w.write_all(&bytes).await?;
        w.flush().await?;
        Ok(bytes.len() as u64)
    }

    async fn save(self: Box<Self>) -> Result<PathBuf> {
        let Self { path, mut workbook } = *self;
        let bytes = workbook.save_to_buffer()?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to save {}", path.display()))?;
        Ok(path)
    }

    async fn discard(self: Box<Self>) {}
}

pub(crate) async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            crate::log_cleanup_failure!(path.display(), e);
        }
    }
}

/// Resolves chunk file names for one export
///
/// The generated part of an empty base name is fixed at construction so that
/// every chunk of the export shares it.
#[derive(Debug, Clone)]
pub struct ChunkNamer {
    base: PathBuf,
}

impl ChunkNamer {
    pub fn new(filename: &str) -> Self {
        Self::in_dir(filename, &std::env::temp_dir())
    }

    /// Like [`new`](Self::new) with relative names placed in `dir`
    pub fn in_dir(filename: &str, dir: &Path) -> Self {
        let base = if filename.is_empty() {
            dir.join(format!(
                "export_{}_{}",
                Local::now().format("%Y%m%d_%H%M%S"),
                rand::thread_rng().gen_range(1000..9999)
            ))
        } else if Path::new(filename).is_absolute() {
            PathBuf::from(filename)
        } else {
            dir.join(filename)
        };
        Self { base }
    }

    /// `<base>_<idx>.<suffix>`
    pub fn path(&self, idx: usize, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.base.as_os_str());
        name.push(format!("_{idx}.{suffix}"));
        PathBuf::from(name)
    }

    /// Archive entry name of chunk `idx`
    pub fn entry_name(&self, idx: usize, suffix: &str) -> String {
        entry_name_of(&self.path(idx, suffix))
    }
}

pub(crate) fn entry_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
