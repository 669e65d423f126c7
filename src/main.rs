//! DataCopy: copy, move, and rename orchestration for project-scoped storage.
//!
//! Each subcommand is one step-function task: it reads a JSON event, performs
//! one unit of work, and writes a JSON outcome to stdout.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use datacopy_core::config::AppConfig;
use datacopy_core::error::AppError;

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => {
            output::print_error(&e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = cli.execute(config).await {
        tracing::error!(error_type = %e.kind, "Task failed: {}", e.message);
        output::print_error(&e);
        std::process::exit(1);
    }
}

/// Load configuration from the config directory and environment.
fn load_configuration(cli: &Cli) -> Result<AppConfig, AppError> {
    let env = cli
        .env
        .clone()
        .or_else(|| std::env::var("DATACOPY_ENV").ok())
        .unwrap_or_else(|| "development".to_string());
    AppConfig::load_from(&cli.config_dir, &env)
}

/// Initialize tracing/logging. Logs go to stderr; stdout carries the outcome.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
