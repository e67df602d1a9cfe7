//! Configuration management
//!
//! `tabex.toml` is parsed into [`TabexConfig`]. Every section is optional.
//! Two environment hooks apply on load:
//! - `${VAR_NAME}` placeholders are substituted before parsing
//! - `TABEX_<SECTION>_<KEY>` variables override parsed values
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [export]
//! format = "xlsx"
//! single_file_max_rows = 50000
//! filename = "orders"
//!
//! [provider]
//! page_size = 2000
//! query_timeout_secs = 30
//!
//! [storage]
//! enabled = true
//! root = "/srv/exports"
//! endpoint = "${TABEX_PUBLIC_URL}"
//!
//! [logging]
//! local_enabled = true
//! local_path = "./logs"
//! local_rotation = "daily"
//! ```
//!
//! ```rust,no_run
//! use tabex::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("tabex.toml")?;
//! println!("Format: {}", config.export.format);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;

pub use loader::{from_toml_str, load_config, load_config_or_default};
pub use schema::{
    ApplicationConfig, ExportConfig, ExportFormat, LoggingConfig, ProviderConfig, StorageConfig,
    TabexConfig,
};
