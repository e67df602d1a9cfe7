//! Archive packager
//!
//! Chunks become deflated zip entries in the order they are added. The
//! archive file is only usable after [`ArchivePackager::finish`]; on any
//! failure the caller drops it through [`ArchivePackager::discard`].

use super::file::{entry_name_of, remove_quietly, TmpFile};
use crate::domain::context::ResultExt;
use crate::domain::{ExportError, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub struct ArchivePackager {
    writer: ZipWriter<File>,
    path: PathBuf,
    entries: Vec<String>,
}

impl ArchivePackager {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path)
            .with_context(|| format!("Failed to create archive {}", path.display()))?;
        Ok(Self {
            writer: ZipWriter::new(file),
            path,
            entries: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a new entry and return its writer
    pub fn start_entry(&mut self, name: &str) -> Result<&mut ZipWriter<File>> {
        if self.entries.iter().any(|e| e == name) {
            return Err(ExportError::Archive(format!("duplicate entry {name}")));
        }
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer.start_file(name, options)?;
        self.entries.push(name.to_string());
        Ok(&mut self.writer)
    }

    /// Copy a finished chunk file in, named after its base name
    pub fn add_file(&mut self, path: &Path) -> Result<()> {
        let mut source = File::open(path)
            .with_context(|| format!("Failed to reopen chunk {}", path.display()))?;
        let entry = self.start_entry(&entry_name_of(path))?;
        std::io::copy(&mut source, entry)?;
        Ok(())
    }

    pub fn add_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.start_entry(name)?.write_all(bytes)?;
        Ok(())
    }

    /// Write the central directory and hand the archive over as a sink
    pub fn finish(mut self) -> Result<TmpFile> {
        let mut file = self.writer.finish()?;
        file.flush()?;
        tracing::debug!(
            path = %self.path.display(),
            entries = self.entries.len(),
            "Archive finalized"
        );
        Ok(TmpFile::new(self.path))
    }

    /// Drop an incomplete archive
    pub async fn discard(self) {
        let Self { writer, path, .. } = self;
        drop(writer);
        remove_quietly(&path).await;
    }
}
