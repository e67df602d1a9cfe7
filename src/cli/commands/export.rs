//! Export command implementation
//!
//! Streams a JSON Lines file through the CSV or XLSX exporter and delivers the
//! artifact to a local path, a chosen output file or the configured storage.

use crate::adapters::storage::LocalStorage;
use crate::cli::{EXIT_CANCELLED, EXIT_CONFIG_ERROR, EXIT_EXPORT_FAILED, EXIT_OK};
use crate::config::{load_config_or_default, ExportFormat, TabexConfig};
use crate::core::export::{CsvExporter, ExcelExporter, ExportContext, Exporter};
use crate::core::provider::JsonLinesDataProvider;
use crate::domain::{ExportError, Header, Headers};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// JSON Lines file, one object or array per line
    #[arg(short, long)]
    pub input: PathBuf,

    /// Columns as `field[:Title]`, comma-separated
    #[arg(long, required = true, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Output format (csv or xlsx)
    #[arg(short, long)]
    pub format: Option<ExportFormat>,

    /// Base file name of the artifact
    #[arg(long)]
    pub filename: Option<String>,

    /// Copy the artifact to this path instead of keeping the generated one
    #[arg(short, long, conflicts_with = "upload")]
    pub output: Option<PathBuf>,

    /// Upload the artifact to the configured storage and print its URL
    #[arg(long)]
    pub upload: bool,

    /// Override export.max_rows
    #[arg(long)]
    pub max_rows: Option<usize>,

    /// Override export.single_file_max_rows
    #[arg(long)]
    pub single_file_max_rows: Option<usize>,

    /// Always produce a zip archive
    #[arg(long, conflicts_with = "force_single_file")]
    pub force_zip: bool,

    /// Never split the output
    #[arg(long)]
    pub force_single_file: bool,

    /// Abort after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Parse `field[:Title]` column arguments
///
/// A missing title reuses the field name.
pub fn parse_columns(specs: &[String]) -> Result<Headers, String> {
    let headers: Headers = specs
        .iter()
        .map(|spec| {
            let (field, title) = match spec.split_once(':') {
                Some((field, title)) => (field.trim(), title.trim()),
                None => (spec.trim(), spec.trim()),
            };
            if field.is_empty() {
                return Err(format!("Invalid column '{spec}': field name is empty"));
            }
            let title = if title.is_empty() { field } else { title };
            Ok(Header::new(field, title))
        })
        .collect::<Result<_, _>>()?;

    if headers.is_empty() {
        return Err("At least one column is required".to_string());
    }
    Ok(headers)
}

impl ExportArgs {
    fn apply_overrides(&self, config: &mut TabexConfig) {
        if let Some(format) = self.format {
            tracing::info!(format = %format, "Overriding export format from CLI");
            config.export.format = format;
        }
        if let Some(filename) = &self.filename {
            config.export.filename = filename.clone();
        }
        if let Some(n) = self.max_rows {
            config.export.max_rows = n;
        }
        if let Some(n) = self.single_file_max_rows {
            config.export.single_file_max_rows = n;
        }
        if self.force_zip {
            config.export.force_zip = true;
        }
        if self.force_single_file {
            config.export.force_single_file = true;
        }
    }

    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting export command");

        let mut config = match load_config_or_default(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };
        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG_ERROR);
        }
        if self.upload && !config.storage.enabled {
            eprintln!("--upload requires [storage] enabled = true");
            return Ok(EXIT_CONFIG_ERROR);
        }

        let headers = match parse_columns(&self.columns) {
            Ok(h) => h,
            Err(e) => {
                eprintln!("{e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        let mut ctx = ExportContext::background().with_shutdown(shutdown_signal);
        if let Some(secs) = self.timeout_secs {
            ctx = ctx.with_timeout(Duration::from_secs(secs));
        }

        match self.run(&config, headers, &ctx).await {
            Ok(location) => {
                println!("{location}");
                Ok(EXIT_OK)
            }
            Err(e) if e.is_cancellation() => {
                tracing::warn!(error = %e, "Export cancelled");
                eprintln!("Export cancelled: {e}");
                Ok(EXIT_CANCELLED)
            }
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                Ok(EXIT_EXPORT_FAILED)
            }
        }
    }

    async fn run(
        &self,
        config: &TabexConfig,
        headers: Headers,
        ctx: &ExportContext,
    ) -> Result<String, ExportError> {
        let provider = JsonLinesDataProvider::open(&self.input).await?;
        let options = config.export.to_options();

        let mut exporter: Box<dyn Exporter> = match config.export.format {
            ExportFormat::Csv => Box::new(CsvExporter::new(headers, provider, options)?),
            ExportFormat::Xlsx => Box::new(ExcelExporter::new(headers, provider, options)?),
        };

        if self.upload {
            let storage = LocalStorage::from_config(&config.storage);
            return exporter.export_to_storage(ctx, &storage).await;
        }

        if let Some(output) = &self.output {
            let mut file = tokio::fs::File::create(output).await?;
            let bytes = exporter.export_to(ctx, &mut file).await?;
            tracing::info!(path = %output.display(), bytes, "Export copied to output");
            return Ok(output.display().to_string());
        }

        let path = exporter.export(ctx).await?;
        Ok(path.display().to_string())
    }
}
