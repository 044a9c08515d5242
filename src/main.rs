//! alertwatch - snapshot alerting tool
//!
//! Evaluates measurement snapshots against configured thresholds and
//! historical baselines, withholding duplicate alerts inside a time window.

use alertwatch::cli::args::{generate_completions, Cli, Commands, ConfigArgs, ConfigCommands};
use alertwatch::commands::{run_config, run_evaluate, run_replay};
use alertwatch::config::{Config, ConfigBuilder};
use alertwatch::error::{AppError, ConfigError, EngineError, StoreError};
use clap::Parser;
use log::LevelFilter;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // RUST_LOG, when set, takes precedence over --verbose and the config file
    let env_filter = std::env::var_os("RUST_LOG").is_some();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
        .format_timestamp(None)
        .init();
    if !env_filter {
        log::set_max_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        });
    }

    // Run the appropriate command
    let result = run(&cli, env_filter);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, env_filter: bool) -> Result<(), AppError> {
    match &cli.command {
        Commands::Completions { shell } => {
            generate_completions(*shell);
            Ok(())
        }

        Commands::Config(ConfigArgs {
            command: command @ ConfigCommands::Init { .. },
        }) => run_config(command, &Config::default(), None, cli.format),

        command => {
            let builder = ConfigBuilder::new()
                .with_file(cli.config.as_deref())?
                .with_window(cli.window)
                .with_alerts_enabled(cli.disable_alerts.then_some(false));
            let source = builder.source().cloned();
            let config = builder.build()?;

            if !env_filter && !cli.verbose {
                log::set_max_level(config.general.log_level_filter()?);
            }

            match command {
                Commands::Evaluate(args) => run_evaluate(args, &config, cli.format),
                Commands::Replay(args) => run_replay(args, &config, cli.format),
                Commands::Config(args) => {
                    run_config(&args.command, &config, source.as_deref(), cli.format)
                }
                Commands::Completions { .. } => Ok(()),
            }
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Config(ConfigError::FileNotFound(_)) => {
            eprintln!();
            eprintln!("Hint: Create one with 'alertwatch config init [PATH]'.");
        }
        AppError::Config(ConfigError::InvalidValue { .. } | ConfigError::MissingField(_)) => {
            eprintln!();
            eprintln!("Hint: Run 'alertwatch config show' to see the effective settings.");
        }
        AppError::InvalidSnapshot { .. } => {
            eprintln!();
            eprintln!("Hint: A snapshot needs at least 'group_id' and an RFC 3339 'captured_at'.");
        }
        AppError::Engine(EngineError::Persist { alerts, .. }) => {
            eprintln!();
            eprintln!(
                "Hint: {} alert(s) were computed but not stored; re-run once the store is reachable.",
                alerts.len()
            );
        }
        AppError::Engine(EngineError::DeadlineExceeded { .. }) => {
            eprintln!();
            eprintln!("Hint: Raise --deadline-ms or reduce the snapshot size.");
        }
        AppError::Store(StoreError::Timeout(_)) => {
            eprintln!();
            eprintln!("Hint: Increase general.store_timeout_ms in the configuration.");
        }
        _ => {}
    }
}
