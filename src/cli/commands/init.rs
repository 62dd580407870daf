//! Init and Config commands.

use std::path::Path;
use std::process::ExitCode;

use crate::config::Settings;

/// Run init command - create configuration file.
pub fn run_init(force: bool) -> ExitCode {
    match Settings::init_config_file(Path::new("."), force) {
        Ok(path) => {
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings) -> ExitCode {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    match config.to_toml() {
        Ok(toml_str) => {
            println!("{toml_str}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error displaying config: {e}");
            ExitCode::FAILURE
        }
    }
}
