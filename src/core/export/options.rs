//! Export options

/// Default (and upper bound) of rows per output file before splitting
pub const SINGLE_FILE_MAX_ROWS: usize = 100_000;

/// Default (and upper bound) of rows per export
pub const MAX_ROWS: usize = 1_000_000;

pub const CSV_SUFFIX: &str = "csv";
pub const EXCEL_SUFFIX: &str = "xlsx";
pub const ZIP_SUFFIX: &str = "zip";

/// Options shared by every exporter
///
/// Setters silently ignore out-of-range values and keep the current one.
///
/// # Examples
///
/// ```
/// use tabex::core::export::ExportOptions;
///
/// let options = ExportOptions::new()
///     .single_file_max_rows(500)
///     .filename("orders")
///     .force_zip(true);
///
/// assert_eq!(options.get_single_file_max_rows(), 500);
/// assert!(options.is_force_zip());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    max_rows: usize,
    single_file_max_rows: usize,
    filename: String,
    row_start: usize,
    col_start: usize,
    force_zip: bool,
    force_single_file: bool,
    fail_on_source_error: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            max_rows: MAX_ROWS,
            single_file_max_rows: SINGLE_FILE_MAX_ROWS,
            filename: String::new(),
            row_start: 0,
            col_start: 0,
            force_zip: false,
            force_single_file: false,
            fail_on_source_error: false,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hard cap on rows per export; accepted when `0 < n < MAX_ROWS`
    pub fn max_rows(mut self, n: usize) -> Self {
        if n > 0 && n < MAX_ROWS {
            self.max_rows = n;
        }
        self
    }

    /// Rows per file before splitting; accepted when `1 <= n < SINGLE_FILE_MAX_ROWS`
    pub fn single_file_max_rows(mut self, n: usize) -> Self {
        if (1..SINGLE_FILE_MAX_ROWS).contains(&n) {
            self.single_file_max_rows = n;
        }
        self
    }

    /// Base file name without suffix
    ///
    /// Relative names are placed in the temp directory. An empty name is
    /// replaced by a generated one.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Rows to skip before the title row (spreadsheets only)
    pub fn row_start(mut self, n: usize) -> Self {
        self.row_start = n;
        self
    }

    /// Columns to skip before the first column (spreadsheets only)
    pub fn col_start(mut self, n: usize) -> Self {
        self.col_start = n;
        self
    }

    /// Always produce an archive, even for a single chunk
    pub fn force_zip(mut self, on: bool) -> Self {
        self.force_zip = on;
        self
    }

    /// Never split, regardless of row count
    pub fn force_single_file(mut self, on: bool) -> Self {
        self.force_single_file = on;
        self
    }

    /// Fail the export when the source stopped because a fetch failed
    pub fn fail_on_source_error(mut self, on: bool) -> Self {
        self.fail_on_source_error = on;
        self
    }

    pub fn get_max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn get_single_file_max_rows(&self) -> usize {
        self.single_file_max_rows
    }

    pub fn get_filename(&self) -> &str {
        &self.filename
    }

    pub fn get_row_start(&self) -> usize {
        self.row_start
    }

    pub fn get_col_start(&self) -> usize {
        self.col_start
    }

    pub fn is_force_zip(&self) -> bool {
        self.force_zip
    }

    pub fn is_force_single_file(&self) -> bool {
        self.force_single_file
    }

    pub fn is_fail_on_source_error(&self) -> bool {
        self.fail_on_source_error
    }

    /// Per-file cap in effect, `None` when splitting is disabled
    pub fn chunk_limit(&self) -> Option<usize> {
        (!self.force_single_file).then_some(self.single_file_max_rows)
    }
}
