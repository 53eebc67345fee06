// Main entry point for richtrace

use clap::Parser;
use std::process::ExitCode;
use tracing::info;

use richtrace::cli::Cli;
use richtrace::commands::{
    apply_cli_overrides, handle_completion, handle_init_config, handle_show_config, run_replay,
};
use richtrace::config::Settings;
use richtrace::logging;
use richtrace::state::ExitStatus;

fn exit(status: ExitStatus) -> ExitCode {
    ExitCode::from(status.code())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Handle completion flag
    if let Some(shell_type) = &cli.completion {
        return match handle_completion(shell_type) {
            Ok(()) => exit(ExitStatus::Ok),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                exit(ExitStatus::UsageError)
            }
        };
    }

    // Handle init_config flag
    if let Some(config_file) = &cli.init_config {
        return match handle_init_config(config_file) {
            Ok(()) => exit(ExitStatus::Ok),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                exit(ExitStatus::UsageError)
            }
        };
    }

    let mut settings = match Settings::load(cli.rich_env_file.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return exit(ExitStatus::UsageError);
        }
    };
    apply_cli_overrides(&mut settings, &cli);

    if cli.show_config {
        handle_show_config(&settings);
        return exit(ExitStatus::Ok);
    }

    if let Err(e) = logging::init_tracing(&settings, cli.verbose > 0) {
        eprintln!("Error: failed to open log file: {}", e);
        return exit(ExitStatus::UsageError);
    }
    info!("Starting richtrace v{}", env!("CARGO_PKG_VERSION"));

    match run_replay(&cli, settings) {
        Ok(status) => exit(status),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit(ExitStatus::InternalError)
        }
    }
}
