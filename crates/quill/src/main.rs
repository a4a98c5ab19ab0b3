//! quill CLI - Embedded directive runner.
//!
//! Provides commands for:
//! - `extract`: List the directives found in a file
//! - `run`: Execute every directive and report the results
//! - `strip`: Remove every directive from a file

mod commands;
mod error;
mod output;
mod resolver;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quill_config::{CliSettings, Config, LOG_LEVELS};
use tracing_subscriber::EnvFilter;

use commands::{ExtractArgs, RunArgs, StripArgs};
use output::Output;

/// quill - Embedded directive runner.
#[derive(Parser)]
#[command(name = "quill", version, about)]
struct Cli {
    /// Path to configuration file (default: auto-discover quill.toml).
    #[arg(short, long, global = true, env = "QUILL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging (overrides RUST_LOG and config).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level used when RUST_LOG is not set (overrides config).
    #[arg(long, global = true, value_parser = LOG_LEVELS)]
    log_level: Option<String>,

    /// Keep tab characters in block directives.
    #[arg(long, global = true)]
    no_strip_tabs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the directives found in a file as JSON.
    Extract(ExtractArgs),
    /// Execute every directive and print the results as JSON.
    Run(RunArgs),
    /// Print a file with every directive removed.
    Strip(StripArgs),
}

impl Cli {
    fn cli_settings(&self) -> CliSettings {
        let chain = match &self.command {
            Commands::Run(args) => args.resolve_chain(),
            Commands::Extract(_) | Commands::Strip(_) => None,
        };
        CliSettings {
            chain,
            strip_tabs: self.no_strip_tabs.then_some(false),
            log_level: self.log_level.clone(),
        }
    }
}

/// Initialize tracing.
///
/// `--verbose` enables DEBUG level, otherwise use `RUST_LOG` or the configured level.
fn init_tracing(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    let config = match Config::load(cli.config.as_deref(), Some(&cli.cli_settings())) {
        Ok(config) => config,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            return ExitCode::FAILURE;
        }
    };
    init_tracing(cli.verbose, &config.log.level);
    if let Some(path) = &config.config_path {
        tracing::debug!(path = %path.display(), "Loaded configuration");
    }

    let result = match cli.command {
        Commands::Extract(args) => args.execute(&config),
        Commands::Run(args) => args.execute(&config),
        Commands::Strip(args) => args.execute(&config),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
