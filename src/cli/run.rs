//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments
//! - Builds CliArgs and discovers Config
//! - Initializes logging and the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

use crate::error_reporter;
use crate::{CliArgs, Config, ExitCode};
use loadbroker_utils::logging::init_tracing;

/// Main CLI execution function.
///
/// Handles ALL output including errors and returns `Err(ExitCode)` on failure.
/// main.rs only calls `std::process::exit(code.as_i32())`; it does NOT print.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        verbose: cli.verbose.then_some(true),
        max_attempts: cli.max_attempts,
        advisory_enabled: cli.advisory_override(),
        advisory_model: cli.advisory_model.clone(),
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => return Err(error_reporter::report(&err, "config")),
    };

    if let Err(e) = init_tracing(config.verbose()) {
        eprintln!("⚠ Failed to initialize logging: {e}");
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let operation = cli.command.operation();

    let result = rt.block_on(async {
        match cli.command {
            Commands::Negotiate {
                rate,
                offer,
                attempt,
                json,
            } => commands::execute_negotiate_command(&rate, offer, attempt, json, &config).await,
            Commands::Simulate { rate, offer, json } => {
                commands::execute_simulate_command(&rate, offer, json, &config).await
            }
            Commands::SearchLoads {
                origin,
                destination,
                equipment_type,
                limit,
                json,
            } => commands::execute_search_loads_command(
                origin,
                destination,
                equipment_type,
                limit,
                json,
                &config,
            ),
            Commands::VerifyCarrier { mc_number, json } => {
                commands::execute_verify_carrier_command(&mc_number, json, &config).await
            }
            Commands::RecordCall { file, json } => {
                commands::execute_record_call_command(&file, json)
            }
            Commands::Config { json } => commands::execute_config_command(json, &config),
        }
    });

    result.map_err(|error| error_reporter::report(&error, operation))
}
