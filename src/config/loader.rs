//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{ExportFormat, TabexConfig};
use crate::domain::errors::ExportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// The file contents go through `${VAR}` substitution, are parsed into
/// [`TabexConfig`], then `TABEX_*` environment overrides are applied and the
/// result is validated.
///
/// # Errors
///
/// Returns `ExportError::Configuration` if the file is missing or unreadable,
/// references unset environment variables, fails to parse or is invalid.
///
/// # Examples
///
/// ```no_run
/// use tabex::config::loader::load_config;
///
/// let config = load_config("tabex.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TabexConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    from_toml_str(&contents)
}

/// Load the file at `path`, or the defaults when it does not exist
///
/// Overrides and validation apply either way.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<TabexConfig> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(path = %path.display(), "Configuration file not found, using defaults");
    let mut config = TabexConfig::default();
    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

/// Parse configuration text, with the same processing as [`load_config`]
pub fn from_toml_str(contents: &str) -> Result<TabexConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: TabexConfig = toml::from_str(&contents)
        .map_err(|e| ExportError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &TabexConfig) -> Result<()> {
    config.validate().map_err(|e| {
        ExportError::Configuration(format!("Configuration validation failed: {}", e))
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. All missing variables are reported in
/// one error.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExportError::Other(format!("invalid placeholder pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    cap[0].to_string()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ExportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ExportError::Configuration(format!("Invalid value for {name}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using the TABEX_* prefix
///
/// Variables follow the pattern `TABEX_<SECTION>_<KEY>`, for example
/// `TABEX_EXPORT_FORMAT` or `TABEX_STORAGE_ENDPOINT`.
fn apply_env_overrides(config: &mut TabexConfig) -> Result<()> {
    if let Ok(val) = std::env::var("TABEX_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Some(format) = env_parse::<ExportFormat>("TABEX_EXPORT_FORMAT")? {
        config.export.format = format;
    }
    if let Some(n) = env_parse("TABEX_EXPORT_MAX_ROWS")? {
        config.export.max_rows = n;
    }
    if let Some(n) = env_parse("TABEX_EXPORT_SINGLE_FILE_MAX_ROWS")? {
        config.export.single_file_max_rows = n;
    }
    if let Ok(val) = std::env::var("TABEX_EXPORT_FILENAME") {
        config.export.filename = val;
    }
    if let Some(n) = env_parse("TABEX_EXPORT_ROW_START")? {
        config.export.row_start = n;
    }
    if let Some(n) = env_parse("TABEX_EXPORT_COL_START")? {
        config.export.col_start = n;
    }
    if let Some(on) = env_parse("TABEX_EXPORT_FORCE_ZIP")? {
        config.export.force_zip = on;
    }
    if let Some(on) = env_parse("TABEX_EXPORT_FORCE_SINGLE_FILE")? {
        config.export.force_single_file = on;
    }
    if let Some(on) = env_parse("TABEX_EXPORT_FAIL_ON_SOURCE_ERROR")? {
        config.export.fail_on_source_error = on;
    }

    if let Some(n) = env_parse("TABEX_PROVIDER_PAGE_SIZE")? {
        config.provider.page_size = n;
    }
    if let Some(n) = env_parse("TABEX_PROVIDER_QUERY_TIMEOUT_SECS")? {
        config.provider.query_timeout_secs = n;
    }

    if let Some(on) = env_parse("TABEX_STORAGE_ENABLED")? {
        config.storage.enabled = on;
    }
    if let Ok(val) = std::env::var("TABEX_STORAGE_ROOT") {
        config.storage.root = val;
    }
    if let Ok(val) = std::env::var("TABEX_STORAGE_ENDPOINT") {
        config.storage.endpoint = val;
    }

    if let Some(on) = env_parse("TABEX_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = on;
    }
    if let Ok(val) = std::env::var("TABEX_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("TABEX_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
