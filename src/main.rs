use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

use flakr::cli::{Cli, parse_duration};
use flakr::command::ShellCommand;
use flakr::config::Config;
use flakr::runner::{self, RunSummary, RunnerConfig};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flakr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("flakr.log");

    // Setup env_logger with file output so the progress line owns the console
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Assemble the run configuration: CLI flags win, config file fills gaps.
fn build_runner_config(cli: &Cli, config: &Config) -> Result<RunnerConfig> {
    let root_command = cli
        .root_command
        .clone()
        .unwrap_or_else(|| config.defaults.root_command.clone());

    let command = ShellCommand::new(&root_command, &cli.command_line())?;

    let refresh = match cli.refresh {
        Some(refresh) => refresh,
        None => parse_duration(&config.defaults.refresh)
            .map_err(|reason| eyre::eyre!("invalid refresh in config: {reason}"))?,
    };

    Ok(RunnerConfig {
        command,
        parallel: cli.parallel.unwrap_or(config.defaults.parallel),
        duration: cli.duration,
        refresh,
        output_file: cli.output_file.clone(),
        stop_on_failure: cli.stop_on_failure,
    })
}

async fn run_application(cli: &Cli, config: &Config) -> Result<RunSummary> {
    let runner_config = build_runner_config(cli, config)?;
    info!(
        "Starting run: {} ({} workers, {:?})",
        runner_config.command, runner_config.parallel, runner_config.duration
    );
    let summary = runner::run(runner_config).await?;
    Ok(summary)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match run_application(&cli, &config).await {
        Ok(summary) => {
            // A run only counts as failed when stop-on-failure was requested
            if cli.stop_on_failure && summary.snapshot.failed > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{}: {err}", "ERROR".red());
            std::process::exit(1);
        }
    }
}
