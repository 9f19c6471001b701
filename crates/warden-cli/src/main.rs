//! Warden CLI
//!
//! Main entry point for the `warden` binary.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use warden_common_config::{ConfigLoader, Environment, WardenConfig};
use warden_common_log::{LogConfig, LogFormat, LogLevel};

mod cli;
mod commands;
mod error;
mod output;

use cli::Cli;
use error::{CliError, Exit};

fn main() -> ExitCode {
    // `.env` has to be loaded before clap reads env-backed flags.
    if let Err(e) = Environment::init() {
        let e = CliError::from(e);
        eprintln!("{e}");
        return e.exit_code().into();
    }

    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("{e}");
        return e.exit_code().into();
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            let e = CliError::from(e);
            eprintln!("{e}");
            return e.exit_code().into();
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => Exit::Success.into(),
        Err(e) => {
            error!("{e}");
            e.exit_code().into()
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    let output = cli.execute(config).await?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<WardenConfig, CliError> {
    let loader = match &cli.config_dir {
        Some(dir) => ConfigLoader::new(dir),
        None => ConfigLoader::from_env(),
    };
    Ok(loader.load()?)
}

/// `WARDEN_LOG_*` settings, with `-v` flags raising the level. Production
/// defaults to JSON output.
fn init_logging(cli: &Cli) -> Result<(), CliError> {
    let mut config = LogConfig::from_env();
    if Environment::is_production() && Environment::get("WARDEN_LOG_FORMAT").is_none() {
        config.format = LogFormat::Json;
    }
    config.level = match cli.verbose {
        0 => config.level,
        1 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };
    warden_common_log::init(config)?;
    Ok(())
}
