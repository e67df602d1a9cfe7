//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// Exit code of a successful command
pub const EXIT_OK: i32 = 0;
/// The export itself failed
pub const EXIT_EXPORT_FAILED: i32 = 1;
/// Configuration or arguments were rejected
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// The export was stopped by a shutdown signal or deadline
pub const EXIT_CANCELLED: i32 = 3;

/// Tabex - bulk tabular export engine
#[derive(Parser, Debug)]
#[command(name = "tabex")]
#[command(version, about, long_about = None)]
#[command(author = "Tabex Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "tabex.toml", env = "TABEX_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TABEX_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export JSON Lines rows to CSV or XLSX
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
