//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Snapshot alerting tool
///
/// Evaluate measurement snapshots against thresholds, rates of change and
/// cross-source discrepancies, withholding duplicates inside a time window.
#[derive(Parser, Debug)]
#[command(name = "alertwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "ALERTWATCH_CONFIG")]
    pub config: Option<String>,

    /// Suppression window in seconds (overrides the config file)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub window: Option<u64>,

    /// Turn every evaluator off
    #[arg(long, global = true)]
    pub disable_alerts: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate one snapshot
    Evaluate(EvaluateArgs),

    /// Replay a JSON-lines file of snapshots through one engine
    Replay(ReplayArgs),

    /// Inspect or create configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the evaluate command
#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Snapshot JSON file
    #[arg(short, long)]
    pub snapshot: PathBuf,

    /// Previous snapshot of the same group, for rate-of-change checks
    #[arg(short, long)]
    pub previous: Option<PathBuf>,

    /// Abandon the evaluation after this many milliseconds
    #[arg(long)]
    pub deadline_ms: Option<u64>,
}

/// Arguments for the replay command
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// File with one snapshot JSON object per line
    pub file: PathBuf,

    /// Deliver alerts to the terminal as they fire and mark them sent
    #[arg(long)]
    pub notify: bool,
}

/// Arguments for config commands
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Validate the configuration and exit
    Check,

    /// Write a default configuration file
    Init {
        /// Destination (defaults to the user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_evaluate() {
        let args = Cli::try_parse_from([
            "alertwatch",
            "evaluate",
            "--snapshot",
            "now.json",
            "--previous",
            "before.json",
        ])
        .unwrap();
        match args.command {
            Commands::Evaluate(eval) => {
                assert_eq!(eval.snapshot, PathBuf::from("now.json"));
                assert_eq!(eval.previous, Some(PathBuf::from("before.json")));
                assert_eq!(eval.deadline_ms, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_globals() {
        let args = Cli::try_parse_from([
            "alertwatch",
            "-v",
            "--window",
            "60",
            "--disable-alerts",
            "replay",
            "feed.jsonl",
            "--notify",
        ])
        .unwrap();
        assert!(args.verbose);
        assert_eq!(args.window, Some(60));
        assert!(args.disable_alerts);
        assert!(matches!(args.command, Commands::Replay(ReplayArgs { notify: true, .. })));
    }

    #[test]
    fn test_cli_rejects_zero_window() {
        assert!(Cli::try_parse_from(["alertwatch", "--window", "0", "config", "check"]).is_err());
    }

    #[test]
    fn test_cli_parse_config_init() {
        let args = Cli::try_parse_from(["alertwatch", "config", "init", "out.toml", "--force"])
            .unwrap();
        match args.command {
            Commands::Config(ConfigArgs {
                command: ConfigCommands::Init { path, force },
            }) => {
                assert_eq!(path, Some(PathBuf::from("out.toml")));
                assert!(force);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_format() {
        let args = Cli::try_parse_from(["alertwatch", "--format", "json", "config", "show"])
            .unwrap();
        assert!(matches!(args.format, OutputFormat::Json));
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
