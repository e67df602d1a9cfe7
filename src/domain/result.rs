//! Result type alias for tabex

use super::errors::ExportError;

/// Result type alias for tabex operations
///
/// # Examples
///
/// ```
/// use tabex::domain::result::Result;
/// use tabex::domain::errors::ExportError;
///
/// fn failing_function() -> Result<()> {
///     Err(ExportError::Configuration("header is empty".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ExportError>;
