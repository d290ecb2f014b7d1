//! Error reporting for the CLI
//!
//! Renders errors with their category, context and suggestions, plus a hint
//! for the operation that was running. Every rendered report is redacted.

use loadbroker_utils::error::{BrokerError, ConfigError, UserFriendlyError};
use loadbroker_utils::exit_codes::ExitCode;
use loadbroker_utils::redaction::redact_secrets;

/// Render a user-facing report for `error` raised during `operation`.
#[must_use]
pub fn create_contextual_report(error: &dyn UserFriendlyError, operation: &str) -> String {
    let mut report = format!("✗ {} error: {}\n", error.category(), error.user_message());

    if let Some(context) = error.context() {
        report.push_str(&format!("\n  Context: {context}\n"));
    }

    let suggestions = error.suggestions();
    if !suggestions.is_empty() {
        report.push_str("\n  Suggestions:\n");
        for (i, suggestion) in suggestions.iter().enumerate() {
            report.push_str(&format!("    {}. {}\n", i + 1, suggestion));
        }
    }

    if let Some(hint) = operation_hint(operation) {
        report.push_str(&format!("\n  {hint}\n"));
    }

    redact_secrets(&report)
}

fn operation_hint(operation: &str) -> Option<&'static str> {
    match operation {
        "config" => Some("Run `loadbroker config` to see the effective values and their sources."),
        "negotiate" | "simulate" => {
            Some("Give either --load-id (with [[loads]] configured) or --board-rate.")
        }
        "search-loads" => Some("Loads are read from the [[loads]] tables of the config file."),
        _ => None,
    }
}

/// Print a report for `error` to stderr and return the exit code to use.
///
/// Library errors map through [`BrokerError::to_exit_code`]; configuration
/// errors from discovery map to [`ExitCode::CLI_ARGS`]; anything else is
/// internal.
pub fn report(error: &anyhow::Error, operation: &str) -> ExitCode {
    if let Some(broker_error) = error.downcast_ref::<BrokerError>() {
        eprintln!("{}", create_contextual_report(broker_error, operation));
        return broker_error.to_exit_code();
    }

    if let Some(config_error) = error.downcast_ref::<ConfigError>() {
        eprintln!("{}", create_contextual_report(config_error, "config"));
        return ExitCode::CLI_ARGS;
    }

    eprintln!("✗ Unexpected error: {}", redact_secrets(&format!("{error:#}")));
    eprintln!("\n  Run with --verbose for more detailed output");
    ExitCode::INTERNAL
}
