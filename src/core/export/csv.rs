//! CSV exporter

use super::archive::ArchivePackager;
use super::context::ExportContext;
use super::exporter::Exporter;
use super::file::{remove_quietly, ChunkNamer, ExportFile, TmpFile};
use super::options::{ExportOptions, CSV_SUFFIX, ZIP_SUFFIX};
use super::pump::{ChunkOutcome, RowEncoder, RowPump};
use crate::core::columns::cell_to_string;
use crate::core::provider::DataProvider;
use crate::domain::context::ResultExt;
use crate::domain::{Headers, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Writes rows as CSV records
pub struct CsvEncoder<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvEncoder<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().flexible(false).from_writer(inner),
        }
    }
}

impl<W: Write> RowEncoder for CsvEncoder<W> {
    fn write_titles(&mut self, titles: &[String]) -> Result<()> {
        self.writer.write_record(titles)?;
        Ok(())
    }

    fn write_row(&mut self, _n: usize, cells: Vec<Value>) -> Result<()> {
        self.writer.write_record(cells.iter().map(cell_to_string))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Exports rows into one CSV file, or a zip of CSV chunks
///
/// # Examples
///
/// ```rust,no_run
/// use tabex::core::export::{CsvExporter, ExportContext, ExportOptions, Exporter};
/// use tabex::core::provider::SliceDataProvider;
/// use tabex::domain::Header;
/// use serde_json::json;
///
/// # async fn example() -> tabex::domain::Result<()> {
/// let rows = SliceDataProvider::new(vec![json!({"id": 1, "name": "ada"})]);
/// let headers = vec![Header::new("id", "ID"), Header::new("name", "Name")];
/// let mut exporter = CsvExporter::new(headers, rows, ExportOptions::new().filename("users"))?;
///
/// let path = exporter.export(&ExportContext::background()).await?;
/// println!("written to {}", path.display());
/// # Ok(())
/// # }
/// ```
pub struct CsvExporter<P> {
    pump: RowPump<P>,
}

impl<P: DataProvider> CsvExporter<P> {
    /// # Errors
    ///
    /// Returns `ExportError::Configuration` when `headers` is empty.
    pub fn new(headers: Headers, provider: P, options: ExportOptions) -> Result<Self> {
        Ok(Self {
            pump: RowPump::new(headers, provider, options)?,
        })
    }

    /// Rows written so far
    pub fn total_rows(&self) -> usize {
        self.pump.total()
    }

    async fn write_file(&mut self, ctx: &ExportContext, path: &Path) -> Result<ChunkOutcome> {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut encoder = CsvEncoder::new(&mut file);
        self.pump.write_chunk(ctx, &mut encoder).await
    }

    async fn build_archive(
        &mut self,
        ctx: &ExportContext,
        namer: &ChunkNamer,
        first: Option<&Path>,
    ) -> Result<(TmpFile, usize)> {
        let mut archive = ArchivePackager::create(namer.path(0, ZIP_SUFFIX))?;
        match self.fill_archive(ctx, namer, first, &mut archive).await {
            Ok(chunks) => Ok((archive.finish()?, chunks)),
            Err(e) => {
                archive.discard().await;
                Err(e)
            }
        }
    }

    async fn fill_archive(
        &mut self,
        ctx: &ExportContext,
        namer: &ChunkNamer,
        first: Option<&Path>,
        archive: &mut ArchivePackager,
    ) -> Result<usize> {
        let mut idx = 0;
        if let Some(path) = first {
            archive.add_file(path)?;
            idx += 1;
        }

        loop {
            let entry = archive.start_entry(&namer.entry_name(idx, CSV_SUFFIX))?;
            let mut encoder = CsvEncoder::new(entry);
            let outcome = self.pump.write_chunk(ctx, &mut encoder).await?;
            crate::log_chunk_written!(idx, outcome.rows, self.pump.total());

            idx += 1;
            if !outcome.has_more {
                return Ok(idx);
            }
        }
    }
}

#[async_trait]
impl<P: DataProvider> Exporter for CsvExporter<P> {
    async fn build(&mut self, ctx: &ExportContext) -> Result<Box<dyn ExportFile>> {
        let started = Instant::now();
        let namer = ChunkNamer::new(self.pump.options().get_filename());
        crate::log_export_start!(CSV_SUFFIX, namer.path(0, CSV_SUFFIX).display());

        if self.pump.options().is_force_zip() {
            let (archive, chunks) = self.build_archive(ctx, &namer, None).await?;
            crate::log_export_complete!(self.pump.total(), chunks, started.elapsed());
            return Ok(Box::new(archive));
        }

        let first_path: PathBuf = namer.path(0, CSV_SUFFIX);
        let first = match self.write_file(ctx, &first_path).await {
            Ok(outcome) => outcome,
            Err(e) => {
                remove_quietly(&first_path).await;
                return Err(e);
            }
        };
        crate::log_chunk_written!(0, first.rows, self.pump.total());

        if !first.has_more {
            crate::log_export_complete!(self.pump.total(), 1, started.elapsed());
            return Ok(Box::new(TmpFile::new(first_path)));
        }

        let archived = self.build_archive(ctx, &namer, Some(&first_path)).await;
        remove_quietly(&first_path).await;
        let (archive, chunks) = archived?;
        crate::log_export_complete!(self.pump.total(), chunks, started.elapsed());
        Ok(Box::new(archive))
    }
}
