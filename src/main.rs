use std::process::ExitCode;

use clap::Parser;
use docpipe::Settings;
use docpipe::bridge::report_unhandled_error;
use docpipe::cli::commands::{combine, event, init, serve, watch};
use docpipe::cli::{Cli, Commands, Runtime};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Init { force } => init::run_init(force),
        Commands::Config => init::run_config(&settings),
        command => {
            let runtime = Runtime::start(&settings);
            let code = run_agent_command(command, &runtime, &settings);
            runtime.finish();
            code
        }
    }
}

fn run_agent_command(command: Commands, runtime: &Runtime, settings: &Settings) -> ExitCode {
    let result = match command {
        Commands::Serve => serve::run(runtime, settings),
        Commands::Watch { dir } => watch::run(runtime, settings, &dir),
        Commands::Event { kind, path } => event::run(runtime, settings, kind, path),
        Commands::Combine { job_dir } => return combine::run(runtime, &job_dir),
        Commands::Init { .. } | Commands::Config => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            report_unhandled_error(&runtime.bridge, &e);
            ExitCode::FAILURE
        }
    }
}
