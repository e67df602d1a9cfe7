//! Spreadsheet exporter

use super::archive::ArchivePackager;
use super::context::ExportContext;
use super::exporter::Exporter;
use super::file::{ChunkNamer, ExcelFile, ExportFile, TmpFile};
use super::options::{ExportOptions, EXCEL_SUFFIX, ZIP_SUFFIX};
use super::pump::{ChunkOutcome, RowEncoder, RowPump};
use crate::core::provider::DataProvider;
use crate::domain::{ColumnStyle, ExportError, Headers, Result};
use async_trait::async_trait;
use rust_xlsxwriter::{Color, ColNum, Format, RowNum, Workbook, Worksheet};
use serde_json::Value;
use std::time::Instant;

/// Per-column width and format, derived once from the headers
#[derive(Debug, Clone, Default)]
pub struct ColumnLayout {
    widths: Vec<Option<f64>>,
    formats: Vec<Option<Format>>,
}

impl ColumnLayout {
    pub fn from_headers(headers: &Headers) -> Self {
        Self {
            widths: headers.iter().map(|h| h.col_width.filter(|w| *w > 0.0)).collect(),
            formats: headers
                .iter()
                .map(|h| h.col_style.as_ref().map(style_to_format))
                .collect(),
        }
    }
}

fn style_to_format(style: &ColumnStyle) -> Format {
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    if style.italic {
        format = format.set_italic();
    }
    if style.text_wrap {
        format = format.set_text_wrap();
    }
    if let Some(num_format) = &style.num_format {
        format = format.set_num_format(num_format);
    }
    if let Some(color) = style.font_color {
        format = format.set_font_color(Color::RGB(color));
    }
    if let Some(color) = style.background_color {
        format = format.set_background_color(Color::RGB(color));
    }
    format
}

fn grid(row: usize, col: usize) -> Result<(RowNum, ColNum)> {
    let row = RowNum::try_from(row)
        .map_err(|_| ExportError::Encoding(format!("row {row} is outside the sheet")))?;
    let col = ColNum::try_from(col)
        .map_err(|_| ExportError::Encoding(format!("column {col} is outside the sheet")))?;
    Ok((row, col))
}

/// Writes rows into a worksheet shifted by the grid origin
pub struct ExcelEncoder<'a> {
    sheet: &'a mut Worksheet,
    layout: &'a ColumnLayout,
    row_start: usize,
    col_start: usize,
}

impl<'a> ExcelEncoder<'a> {
    /// Apply column widths and formats, before any row is written
    pub fn new(
        sheet: &'a mut Worksheet,
        layout: &'a ColumnLayout,
        row_start: usize,
        col_start: usize,
    ) -> Result<Self> {
        for (i, width) in layout.widths.iter().enumerate() {
            if let Some(width) = width {
                let (_, col) = grid(0, col_start + i)?;
                sheet.set_column_width(col, *width)?;
            }
        }
        for (i, format) in layout.formats.iter().enumerate() {
            if let Some(format) = format {
                let (_, col) = grid(0, col_start + i)?;
                sheet.set_column_format(col, format)?;
            }
        }
        Ok(Self {
            sheet,
            layout,
            row_start,
            col_start,
        })
    }

    fn write_cell(&mut self, row: RowNum, col: ColNum, i: usize, cell: &Value) -> Result<()> {
        let format = self.layout.formats.get(i).and_then(Option::as_ref);
        match (cell, format) {
            (Value::Null, _) => {}
            (Value::Bool(b), Some(f)) => {
                self.sheet.write_boolean_with_format(row, col, *b, f)?;
            }
            (Value::Bool(b), None) => {
                self.sheet.write_boolean(row, col, *b)?;
            }
            (Value::Number(n), _) if n.as_f64().is_some() => {
                let n = n.as_f64().unwrap_or_default();
                match format {
                    Some(f) => self.sheet.write_number_with_format(row, col, n, f)?,
                    None => self.sheet.write_number(row, col, n)?,
                };
            }
            (Value::String(s), Some(f)) => {
                self.sheet.write_string_with_format(row, col, s, f)?;
            }
            (Value::String(s), None) => {
                self.sheet.write_string(row, col, s)?;
            }
            (other, _) => {
                let text = other.to_string();
                match format {
                    Some(f) => self.sheet.write_string_with_format(row, col, text, f)?,
                    None => self.sheet.write_string(row, col, text)?,
                };
            }
        }
        Ok(())
    }
}

impl RowEncoder for ExcelEncoder<'_> {
    fn write_titles(&mut self, titles: &[String]) -> Result<()> {
        for (i, title) in titles.iter().enumerate() {
            let (row, col) = grid(self.row_start, self.col_start + i)?;
            self.sheet.write_string(row, col, title)?;
        }
        Ok(())
    }

    fn write_row(&mut self, n: usize, cells: Vec<Value>) -> Result<()> {
        for (i, cell) in cells.iter().enumerate() {
            let (row, col) = grid(self.row_start + n, self.col_start + i)?;
            self.write_cell(row, col, i, cell)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    fn render_row(&self, n: usize) -> usize {
        self.row_start + 1 + n
    }

    fn render_col_offset(&self) -> usize {
        self.col_start
    }
}

/// Exports rows into one `.xlsx` workbook, or a zip of workbooks
pub struct ExcelExporter<P> {
    pump: RowPump<P>,
    layout: ColumnLayout,
}

impl<P: DataProvider> ExcelExporter<P> {
    /// # Errors
    ///
    /// Returns `ExportError::Configuration` when `headers` is empty.
    pub fn new(headers: Headers, provider: P, options: ExportOptions) -> Result<Self> {
        let layout = ColumnLayout::from_headers(&headers);
        Ok(Self {
            pump: RowPump::new(headers, provider, options)?,
            layout,
        })
    }

    /// Rows written so far
    pub fn total_rows(&self) -> usize {
        self.pump.total()
    }

    async fn write_workbook(&mut self, ctx: &ExportContext) -> Result<(Workbook, ChunkOutcome)> {
        let row_start = self.pump.options().get_row_start();
        let col_start = self.pump.options().get_col_start();

        let mut workbook = Workbook::new();
        let outcome = {
            let sheet = workbook.add_worksheet();
            let mut encoder = ExcelEncoder::new(sheet, &self.layout, row_start, col_start)?;
            self.pump.write_chunk(ctx, &mut encoder).await?
        };
        Ok((workbook, outcome))
    }

    async fn build_archive(
        &mut self,
        ctx: &ExportContext,
        namer: &ChunkNamer,
        first: Option<Workbook>,
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
        first: Option<Workbook>,
        archive: &mut ArchivePackager,
    ) -> Result<usize> {
        let mut idx = 0;
        if let Some(mut workbook) = first {
            archive.add_bytes(&namer.entry_name(idx, EXCEL_SUFFIX), &workbook.save_to_buffer()?)?;
            idx += 1;
        }

        loop {
            let (mut workbook, outcome) = self.write_workbook(ctx).await?;
            archive.add_bytes(&namer.entry_name(idx, EXCEL_SUFFIX), &workbook.save_to_buffer()?)?;
            crate::log_chunk_written!(idx, outcome.rows, self.pump.total());

            idx += 1;
            if !outcome.has_more {
                return Ok(idx);
            }
        }
    }
}

#[async_trait]
impl<P: DataProvider> Exporter for ExcelExporter<P> {
    async fn build(&mut self, ctx: &ExportContext) -> Result<Box<dyn ExportFile>> {
        let started = Instant::now();
        let namer = ChunkNamer::new(self.pump.options().get_filename());
        crate::log_export_start!(EXCEL_SUFFIX, namer.path(0, EXCEL_SUFFIX).display());

        if self.pump.options().is_force_zip() {
            let (archive, chunks) = self.build_archive(ctx, &namer, None).await?;
            crate::log_export_complete!(self.pump.total(), chunks, started.elapsed());
            return Ok(Box::new(archive));
        }

        let (workbook, first) = self.write_workbook(ctx).await?;
        crate::log_chunk_written!(0, first.rows, self.pump.total());

        if !first.has_more {
            crate::log_export_complete!(self.pump.total(), 1, started.elapsed());
            return Ok(Box::new(ExcelFile::new(
                namer.path(0, EXCEL_SUFFIX),
                workbook,
            )));
        }

        let (archive, chunks) = self.build_archive(ctx, &namer, Some(workbook)).await?;
        crate::log_export_complete!(self.pump.total(), chunks, started.elapsed());
        Ok(Box::new(archive))
    }
}
