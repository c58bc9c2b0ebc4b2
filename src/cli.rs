//! CLI definitions for hostwatch.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// hostwatch CLI.
#[derive(Parser, Debug)]
#[command(name = "hostwatch")]
#[command(about = "Polling host monitor with Telegram alerts")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (TOML, or JSON with a .json extension)
    #[arg(
        short,
        long,
        default_value = "hostwatch.toml",
        env = "HOSTWATCH_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Commands {
    /// Poll until SIGINT or SIGTERM (default)
    Run,

    /// Send the startup reports, run a single check and exit
    Once,

    /// Load and validate the configuration, then exit
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_run() {
        let cli = Cli::try_parse_from(["hostwatch"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["hostwatch", "validate", "-c", "/etc/hostwatch.toml"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Validate));
        assert_eq!(cli.config, PathBuf::from("/etc/hostwatch.toml"));
    }

    #[test]
    fn test_once_subcommand() {
        let cli = Cli::try_parse_from(["hostwatch", "--config", "x.json", "once"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Once));
        assert_eq!(cli.config, PathBuf::from("x.json"));
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(Cli::try_parse_from(["hostwatch", "daemon"]).is_err());
    }
}
