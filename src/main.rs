//! hostwatch - polling host monitor.
//!
//! Watches a Mullvad tunnel, systemd units, the Lightning node's payment log
//! and a BTCPay Server health endpoint, and reports changes to Telegram.

mod cli;
mod logging;
mod signal;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};

use hostwatch_config::{Config, ConfigError, ConfigLoader, ConfigValidator, ValidationWarning};
use hostwatch_monitor::Monitor;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("hostwatch: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (config, warnings) = load_config(&cli.config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Validate => {
            for warning in &warnings {
                println!("warning: {}: {}", warning.path, warning.message);
            }
            println!("Configuration OK: {}", cli.config.display());
            Ok(())
        }
        Commands::Once => {
            let mut monitor = start(&config, &warnings)?;
            monitor.run_once().await;
            info!("Single check complete");
            Ok(())
        }
        Commands::Run => {
            let mut monitor = start(&config, &warnings)?;
            let shutdown = signal::shutdown_signal()?;
            monitor.run(shutdown).await?;
            Ok(())
        }
    }
}

/// Load and validate. Validation errors are fatal, warnings are returned.
fn load_config(path: &Path) -> Result<(Config, Vec<ValidationWarning>), ConfigError> {
    let config = ConfigLoader::load(path)?;
    let warnings = ConfigValidator::validate(&config)?.into_result()?;
    Ok((config, warnings))
}

fn start(
    config: &Config,
    warnings: &[ValidationWarning],
) -> Result<Monitor, Box<dyn std::error::Error>> {
    logging::init_tracing(&config.logging)?;
    info!("Starting hostwatch v{}", env!("CARGO_PKG_VERSION"));

    for warning in warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }

    Ok(Monitor::from_config(config)?)
}
