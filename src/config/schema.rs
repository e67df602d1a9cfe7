//! Configuration schema types
//!
//! Every section is optional in the TOML file; missing keys take the defaults
//! below.

use crate::core::export::{ExportOptions, MAX_ROWS, SINGLE_FILE_MAX_ROWS};
use crate::core::provider::{PagedSource, DEFAULT_PAGE_SIZE, DEFAULT_QUERY_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration mapped from `tabex.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabexConfig {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TabexConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.export.validate()?;
        self.provider.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Xlsx => write!(f, "xlsx"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            other => Err(format!("Invalid export format '{other}'. Must be one of: csv, xlsx")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub format: ExportFormat,

    /// Hard cap on rows per export
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Rows per file before output is split into an archive
    #[serde(default = "default_single_file_max_rows")]
    pub single_file_max_rows: usize,

    /// Base file name; empty generates one
    #[serde(default)]
    pub filename: String,

    /// Spreadsheet grid origin (0-based)
    #[serde(default)]
    pub row_start: usize,

    #[serde(default)]
    pub col_start: usize,

    #[serde(default)]
    pub force_zip: bool,

    #[serde(default)]
    pub force_single_file: bool,

    /// Fail instead of truncating when the row source stops on an error
    #[serde(default)]
    pub fail_on_source_error: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            max_rows: default_max_rows(),
            single_file_max_rows: default_single_file_max_rows(),
            filename: String::new(),
            row_start: 0,
            col_start: 0,
            force_zip: false,
            force_single_file: false,
            fail_on_source_error: false,
        }
    }
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_rows == 0 || self.max_rows > MAX_ROWS {
            return Err(format!(
                "export.max_rows must be between 1 and {MAX_ROWS}, got {}",
                self.max_rows
            ));
        }
        if self.single_file_max_rows == 0 || self.single_file_max_rows > SINGLE_FILE_MAX_ROWS {
            return Err(format!(
                "export.single_file_max_rows must be between 1 and {SINGLE_FILE_MAX_ROWS}, got {}",
                self.single_file_max_rows
            ));
        }
        Ok(())
    }

    /// Build exporter options from this section
    pub fn to_options(&self) -> ExportOptions {
        ExportOptions::new()
            .max_rows(self.max_rows)
            .single_file_max_rows(self.single_file_max_rows)
            .filename(self.filename.clone())
            .row_start(self.row_start)
            .col_start(self.col_start)
            .force_zip(self.force_zip)
            .force_single_file(self.force_single_file)
            .fail_on_source_error(self.fail_on_source_error)
    }
}

/// Paging defaults for query-backed row sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            query_timeout_secs: default_query_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("provider.page_size must be greater than 0".to_string());
        }
        if self.query_timeout_secs == 0 {
            return Err("provider.query_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Configure a paged row source with this section's page size and timeout
    ///
    /// ```rust,no_run
    /// use tabex::config::ProviderConfig;
    /// use tabex::core::provider::{FnPageQuery, PageDataProvider};
    /// use serde_json::Value;
    ///
    /// let query = FnPageQuery::new(|_offset: usize, _limit: usize| async {
    ///     Ok::<_, tabex::domain::ExportError>(Vec::<Value>::new())
    /// });
    /// let provider = ProviderConfig::default().apply(PageDataProvider::new(query));
    /// assert_eq!(provider.limit(), 2000);
    /// ```
    pub fn apply<P: PagedSource>(&self, source: P) -> P {
        source.paged(self.page_size, self.query_timeout())
    }
}

/// Local object storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Directory objects are written below
    #[serde(default = "default_storage_root")]
    pub root: String,

    /// Public URL prefix the root is served under
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            root: default_storage_root(),
            endpoint: default_storage_endpoint(),
        }
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        if self.root.trim().is_empty() {
            return Err("storage.root cannot be empty".to_string());
        }
        let endpoint = url::Url::parse(&self.endpoint)
            .map_err(|e| format!("Invalid storage.endpoint '{}': {e}", self.endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https" | "file") {
            return Err(format!(
                "storage.endpoint must use http, https or file, got '{}'",
                endpoint.scheme()
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable the rolling JSON log file
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory of the log file
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_rows() -> usize {
    MAX_ROWS
}

fn default_single_file_max_rows() -> usize {
    SINGLE_FILE_MAX_ROWS
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_query_timeout_secs() -> u64 {
    DEFAULT_QUERY_TIMEOUT.as_secs()
}

fn default_storage_root() -> String {
    "./exports".to_string()
}

fn default_storage_endpoint() -> String {
    "http://localhost:8080/exports".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_defaults_are_valid() {
        let config = TabexConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.export.format, ExportFormat::Csv);
        assert_eq!(config.provider.page_size, 2000);
        assert_eq!(config.provider.query_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test_case(0, 10 => false ; "zero total cap")]
    #[test_case(MAX_ROWS + 1, 10 => false ; "total cap above limit")]
    #[test_case(10, 0 => false ; "zero file cap")]
    #[test_case(10, SINGLE_FILE_MAX_ROWS + 1 => false ; "file cap above limit")]
    #[test_case(500, 100 => true ; "in range")]
    fn test_export_limits(max_rows: usize, single_file_max_rows: usize) -> bool {
        let config = ExportConfig {
            max_rows,
            single_file_max_rows,
            ..Default::default()
        };
        config.validate().is_ok()
    }

    #[test]
    fn test_to_options_carries_every_field() {
        let config = ExportConfig {
            max_rows: 500,
            single_file_max_rows: 50,
            filename: "orders".to_string(),
            row_start: 2,
            col_start: 1,
            force_zip: true,
            fail_on_source_error: true,
            ..Default::default()
        };
        let options = config.to_options();
        assert_eq!(options.get_max_rows(), 500);
        assert_eq!(options.get_single_file_max_rows(), 50);
        assert_eq!(options.get_filename(), "orders");
        assert_eq!(options.get_row_start(), 2);
        assert_eq!(options.get_col_start(), 1);
        assert!(options.is_force_zip());
        assert!(!options.is_force_single_file());
        assert!(options.is_fail_on_source_error());
    }

    #[test_case("csv" => Ok(ExportFormat::Csv))]
    #[test_case("XLSX" => Ok(ExportFormat::Xlsx))]
    #[test_case("excel" => Ok(ExportFormat::Xlsx))]
    fn test_format_parses(input: &str) -> Result<ExportFormat, String> {
        input.parse()
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!("parquet".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_storage_endpoint_checked_only_when_enabled() {
        let mut config = StorageConfig {
            endpoint: "not a url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.enabled = true;
        assert!(config.validate().is_err());

        config.endpoint = "ftp://files.example.com".to_string();
        assert!(config.validate().is_err());

        config.endpoint = "https://files.example.com/exports".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_rotation_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.local_rotation = "size".to_string();
        assert!(config.validate().is_err());
    }
}
