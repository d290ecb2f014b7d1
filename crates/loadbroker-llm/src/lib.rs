//! LLM backend abstraction for the advisory evaluator
//!
//! Providers implement [`LlmBackend`]; the negotiation engine only sees the
//! trait, so tests can substitute scripted backends.

mod budgeted_backend;
mod http_client;
mod openai_backend;
mod types;

pub use budgeted_backend::BudgetedBackend;
pub use loadbroker_utils::error::LlmError;
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};

use loadbroker_config::Config;
use openai_backend::OpenAiBackend;

/// Name reported by the default advisory provider
pub const DEFAULT_PROVIDER: &str = openai_backend::PROVIDER_NAME;

/// Create the advisory backend described by `[advisory]`.
///
/// Returns `Ok(None)` when the advisory path is disabled. The backend is wrapped
/// in a [`BudgetedBackend`] for cost control.
///
/// # Errors
///
/// Returns `LlmError::Misconfiguration` if the advisory path is enabled but the
/// provider cannot be constructed (missing API key, HTTP client failure).
pub fn from_config(config: &Config) -> Result<Option<Box<dyn LlmBackend>>, LlmError> {
    if !config.advisory_enabled() {
        return Ok(None);
    }

    let backend = OpenAiBackend::new_from_config(config)?;
    let budgeted =
        BudgetedBackend::with_limit_from_config(Box::new(backend), config.advisory.budget);
    Ok(Some(Box::new(budgeted)))
}
