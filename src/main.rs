// ABOUTME: Entry point for the deckhand CLI application.
// ABOUTME: Parses arguments, dispatches to command handlers, and maps results to exit codes.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use deckhand::config;
use deckhand::error::Result;
use deckhand::output::Output;
use deckhand::report::RunStatus;
use std::env;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Setup failures, unmet prerequisites, and anything unexpected.
const EXIT_SETUP_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = cli.output_mode();

    // Run on a separate task so a panic surfaces as a JoinError instead of
    // unwinding through main.
    match tokio::spawn(run(cli)).await {
        Ok(Ok(status)) => ExitCode::from(status.exit_code() as u8),
        Ok(Err(e)) => {
            Output::new(mode).error(&e.to_string());
            ExitCode::from(EXIT_SETUP_FAILURE)
        }
        Err(e) => {
            Output::new(mode).error(&format!("unexpected failure: {e}"));
            ExitCode::from(EXIT_SETUP_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> Result<RunStatus> {
    let workspace = env::current_dir()?;
    let output = Output::new(cli.output_mode());

    match cli.command {
        None => commands::deploy(&workspace, cli.deploy, output).await,
        Some(Commands::Deploy(args)) => commands::deploy(&workspace, args, output).await,
        Some(Commands::Init { force }) => {
            config::init_config(&workspace, force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(RunStatus::Succeeded)
        }
        Some(Commands::Publish) => commands::publish(&workspace, output).await,
        Some(Commands::Configure { target_dir }) => {
            let target_dir = workspace.join(target_dir);
            commands::configure(&workspace, &target_dir, output).await
        }
    }
}
