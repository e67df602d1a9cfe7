//! Init command implementation
//!
//! Writes a starter `tabex.toml`.

use crate::cli::{EXIT_CONFIG_ERROR, EXIT_EXPORT_FAILED, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "tabex.toml")]
    pub output: String,

    /// Include commented explanations for every setting
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG_ERROR);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Validate configuration: tabex validate-config");
                println!("  3. Run export: tabex export --input rows.jsonl --columns id:ID");
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_EXPORT_FAILED)
            }
        }
    }

    fn generate_minimal_config() -> String {
        r#"# Tabex Configuration File

[application]
log_level = "info"

[export]
format = "csv"
single_file_max_rows = 100000
filename = ""

[storage]
enabled = false
root = "./exports"
endpoint = "http://localhost:8080/exports"

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    fn generate_config_with_examples() -> String {
        r#"# Tabex Configuration File
#
# Every section is optional. ${VAR} placeholders are replaced with
# environment variables, and TABEX_<SECTION>_<KEY> variables override
# any value below (e.g. TABEX_EXPORT_FORMAT=xlsx).

[application]
# trace | debug | info | warn | error
log_level = "info"

[export]
# csv | xlsx
format = "csv"

# Hard cap on rows per export; exceeding it fails the export
max_rows = 1000000

# Rows per file; larger exports are split into a zip of numbered chunks
single_file_max_rows = 100000

# Base name of the artifact (<filename>_<index>.<ext>). Relative names are
# placed in the system temp directory; empty generates a timestamped name.
filename = ""

# Spreadsheet grid origin, 0-based (xlsx only)
row_start = 0
col_start = 0

# Always produce a zip, even for a single chunk
force_zip = false

# Never split, whatever the row count
force_single_file = false

# Fail instead of truncating when the row source stops on an error
fail_on_source_error = false

[provider]
# Paging of query-backed sources built with ProviderConfig::apply.
# JSON Lines input read by `tabex export` is not paged.
# Rows fetched per page
page_size = 2000

# Per-page query timeout
query_timeout_secs = 30

[storage]
# Required by `tabex export --upload`
enabled = false
root = "./exports"
# endpoint = "${TABEX_PUBLIC_URL}"
endpoint = "http://localhost:8080/exports"

[logging]
# JSON log file in addition to console output
local_enabled = false
local_path = "./logs"
# daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::from_toml_str;
    use tempfile::TempDir;

    #[test]
    fn test_generated_configs_are_loadable() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config = from_toml_str(&content).unwrap();
            assert!(!config.storage.enabled);
        }
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("tabex.toml");
        std::fs::write(&output, "keep").unwrap();

        let mut args = InitArgs {
            output: output.to_string_lossy().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG_ERROR);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "keep");

        args.force = true;
        assert_eq!(args.execute().await.unwrap(), EXIT_OK);
        assert!(std::fs::read_to_string(&output).unwrap().contains("[export]"));
    }
}
