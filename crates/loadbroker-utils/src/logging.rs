//! Logging and observability infrastructure for loadbroker
//!
//! Structured logging through `tracing`, with one span per negotiation round
//! and redaction applied to every error string before it is recorded.

use std::io::IsTerminal;
use tracing::{Level, info, span, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_secrets;

/// Check if colored output should be used.
///
/// Returns true only if stderr is a terminal and `NO_COLOR` is not set.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence. Otherwise verbose mode enables debug output for
/// the loadbroker crates and adds targets and span close events.
/// Logs go to stderr so that `--json` output on stdout stays machine-readable.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("loadbroker=debug,loadbroker_engine=debug,loadbroker_llm=debug,loadbroker_desk=debug,info")
            } else {
                EnvFilter::try_new("loadbroker=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Create a span scoping one negotiation round.
pub fn negotiation_span(load_id: Option<&str>, attempt: u32) -> tracing::Span {
    span!(
        Level::INFO,
        "negotiation_round",
        load_id = load_id.unwrap_or("-"),
        attempt = attempt,
    )
}

/// Log the decision reached for a round.
pub fn log_round_decision(status: &str, target_rate: f64, attempts: u32, provider: &str) {
    info!(
        status = status,
        target_rate = target_rate,
        next_attempts = attempts,
        provider = provider,
        "Negotiation round decided"
    );
}

/// Log an advisory provider failure that triggered the deterministic fallback.
///
/// The reason is redacted before it is recorded.
pub fn log_advisory_fallback(provider: &str, reason: &str) {
    warn!(
        provider = provider,
        reason = %redact_secrets(reason),
        "Advisory evaluator failed; using deterministic policy"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiation_span_is_constructible_without_subscriber() {
        let span = negotiation_span(Some("L1234"), 2);
        let _guard = span.enter();
        log_round_decision("counter", 2400.0, 3, "deterministic");
        log_advisory_fallback("openai", "timeout with Bearer abc123");
    }
}
