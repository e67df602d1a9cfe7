//! Validate config command implementation

use crate::cli::{EXIT_CONFIG_ERROR, EXIT_OK};
use crate::config::load_config;
use clap::Args;

#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// Loading already validates, so a loaded config is a valid one.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Format: {}", config.export.format);
        println!("  Max Rows: {}", config.export.max_rows);
        println!("  Rows per File: {}", config.export.single_file_max_rows);
        if config.export.force_zip {
            println!("  Output: always zipped");
        } else if config.export.force_single_file {
            println!("  Output: never split");
        }
        println!(
            "  Page Size: {} ({}s timeout)",
            config.provider.page_size, config.provider.query_timeout_secs
        );
        if config.storage.enabled {
            println!("  Storage Root: {}", config.storage.root);
            println!("  Storage Endpoint: {}", config.storage.endpoint);
        } else {
            println!("  Storage: disabled");
        }
        println!();
        Ok(EXIT_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let code = ValidateArgs {}
            .execute("does-not-exist.toml")
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG_ERROR);
    }
}
