//! Domain error types
//!
//! This module defines the error hierarchy for tabex.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main tabex error type
///
/// Every fallible operation in the library returns this type. Encoder, archive
/// and storage failures are flattened into string payloads so callers never
/// depend on the underlying crates.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Configuration-related errors (including an empty header specification)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Total exported rows exceeded the configured maximum
    #[error("export quantity exceeds maximum limit ({limit})")]
    MaximumLimit { limit: usize },

    /// The caller cancelled the export
    #[error("Export cancelled: {0}")]
    Cancelled(String),

    /// The export context deadline elapsed
    #[error("Export deadline exceeded")]
    DeadlineExceeded,

    /// The row source stopped early because a page fetch failed
    #[error("Data source failed: {0}")]
    SourceFailed(String),

    /// Tabular encoder errors (CSV or spreadsheet)
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Archive container errors
    #[error("Archive error: {0}")]
    Archive(String),

    /// Object storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl ExportError {
    /// Whether the error was caused by cancellation or an elapsed deadline
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled(_) | Self::DeadlineExceeded)
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ExportError {
    fn from(err: toml::de::Error) -> Self {
        ExportError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Encoding(format!("csv: {err}"))
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Encoding(format!("xlsx: {err}"))
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        ExportError::Archive(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_error_display() {
        let err = ExportError::Configuration("header is empty".to_string());
        assert_eq!(err.to_string(), "Configuration error: header is empty");
    }

    #[test]
    fn test_maximum_limit_display() {
        let err = ExportError::MaximumLimit { limit: 10 };
        assert!(err
            .to_string()
            .starts_with("export quantity exceeds maximum limit"));
    }

    #[test]
    fn test_is_cancellation() {
        assert!(ExportError::Cancelled("shutdown".to_string()).is_cancellation());
        assert!(ExportError::DeadlineExceeded.is_cancellation());
        assert!(!ExportError::MaximumLimit { limit: 1 }.is_cancellation());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: ExportError = io_err.into();
        assert!(matches!(err, ExportError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ExportError = json_err.into();
        assert!(matches!(err, ExportError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: ExportError = toml_err.into();
        assert!(matches!(err, ExportError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_zip_error_conversion() {
        let zip_err = zip::result::ZipError::FileNotFound;
        let err: ExportError = zip_err.into();
        assert!(matches!(err, ExportError::Archive(_)));
    }
}
