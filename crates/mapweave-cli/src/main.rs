//! Mapweave CLI - Command-line interface for bidirectional data mapping
//!
//! This is the main entry point for the Mapweave CLI application, providing
//! commands for mapping documents through a definition in either direction
//! and for checking that definitions compile.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    let config = match Config::load_with_file(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(&e, cli.use_color()),
    };

    let use_color = cli.use_color() && config.output.color;
    control::set_override(use_color);

    let _log_guard = match init_logging(&cli, &config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    if let Err(e) = run(cli, config, use_color).await {
        exit_with(&e, use_color);
    }
}

fn exit_with(e: &error::Error, use_color: bool) -> ! {
    eprintln!("{}", error::format_error(e, use_color));

    if e.should_show_help() {
        eprintln!("\nFor more information, try '--help'");
    }

    process::exit(e.exit_code());
}

/// Main application logic
#[instrument(skip(cli, config, use_color), fields(command = ?cli.command))]
async fn run(cli: Cli, config: Config, use_color: bool) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let mut output = OutputWriter::new(cli.output, use_color, cli.quiet);
    if !config.output.progress {
        output.disable_progress();
    }

    tracing::info!(
        verbosity = cli.verbosity_level(),
        run_id = logging::current_run_id().unwrap_or("unknown"),
        "Executing command"
    );

    match cli.command {
        Commands::Map(args) => handlers::handle_map(args, &config, &mut output).await,
        Commands::Check(args) => handlers::handle_check(args, &config, &mut output).await,
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output).await,
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<Option<WorkerGuard>> {
    let mut logging_config = LoggingConfig::from_config(&config.logging);
    logging_config.apply_verbosity(cli.verbosity_level());
    logging_config.merge_with_env();

    if cli.quiet {
        logging_config.level = "error".to_string();
        logging_config.console = false;
    }

    logging::init_logging(logging_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["mapweave", "check", "mapping.json"]);
        assert_eq!(cli.verbosity_level(), 0);

        let cli = Cli::parse_from(["mapweave", "-vv", "check", "mapping.json"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["mapweave", "--quiet", "map", "mapping.json"]);
        assert_eq!(cli.verbosity_level(), 0);
    }
}
