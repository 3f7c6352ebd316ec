//! Shared components for CLI commands
//!
//! Logging setup, configuration loading and small output helpers used by
//! every subcommand.

use crate::app::services::registry::IndexRegistry;
use crate::cli::args::CommonArgs;
use crate::config::IndexConfig;
use crate::constants::LOG_TARGET;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Summary of one command run, for the caller's exit handling
#[derive(Debug, Clone, Default)]
pub struct CommandStats {
    /// Rows printed (products, stations or snapshot files)
    pub items_reported: usize,
    /// Total command time
    pub elapsed: Duration,
}

/// Set up structured logging on stderr
///
/// `RUST_LOG` overrides the level derived from `-v`/`-q`.
pub fn setup_logging(args: &CommonArgs) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", LOG_TARGET, log_level)));

    // try_init: a subscriber may already be installed (tests, embedding)
    let result = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

/// Load the configuration named on the command line, or the default one
pub fn load_configuration(args: &CommonArgs) -> Result<IndexConfig> {
    match &args.config_file {
        Some(path) => info!("Using config file: {}", path.display()),
        None => info!("No config file given, using the default location or built-in defaults"),
    }

    let config = IndexConfig::load(args.config_file.as_deref())
        .context("Failed to load configuration")?;
    debug!("Configuration: {:?}", config);
    Ok(config)
}

/// Build a registry from the command line configuration
pub fn open_registry(args: &CommonArgs) -> Result<IndexRegistry> {
    let config = load_configuration(args)?;
    IndexRegistry::new(config).context("Invalid configuration")
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode JSON output")?;
    println!("{}", json);
    Ok(())
}

/// Create a spinner for work of unknown length
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::OutputFormat;
    use crate::config::DatasetConfig;
    use tempfile::TempDir;

    fn common(config_file: Option<std::path::PathBuf>) -> CommonArgs {
        CommonArgs {
            config_file,
            verbose: 0,
            quiet: true,
            output_format: OutputFormat::Json,
            today: None,
        }
    }

    #[test]
    fn test_open_registry_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        IndexConfig::default()
            .with_dataset(DatasetConfig::new("nexrad/level2", temp_dir.path()))
            .to_file(&path)
            .unwrap();

        let registry = open_registry(&common(Some(path))).unwrap();
        assert!(registry.config().dataset("nexrad/level2").is_some());
    }

    #[test]
    fn test_missing_config_file_reports_context() {
        let temp_dir = TempDir::new().unwrap();
        let error = load_configuration(&common(Some(temp_dir.path().join("none.toml"))))
            .unwrap_err();
        assert!(format!("{:#}", error).starts_with("Failed to load configuration"));
    }
}
