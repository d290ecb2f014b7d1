//! Negotiation decision engine for loadbroker
//!
//! Turns `(board_rate, offer, attempt)` into an accept, counter or reject
//! decision. The deterministic policy is always available; an LLM-backed
//! advisory evaluator can be layered on top and falls back to the policy on
//! any failure.
//!
//! ```rust
//! use loadbroker_engine::{NegotiationPolicy, NegotiationRound, Status, evaluate};
//!
//! let decision = evaluate(&NegotiationPolicy::default(), &NegotiationRound::new(2000.0, 2500.0, 1))?;
//! assert_eq!(decision.status, Status::Counter);
//! assert_eq!(decision.target_rate, 2400.0);
//! assert_eq!(decision.attempts, 2);
//! # Ok::<(), loadbroker_utils::error::NegotiationError>(())
//! ```

mod advisory;
mod evaluator;
mod messages;
mod orchestrator;
mod policy;
mod provider;
mod rate_source;
mod types;

pub use advisory::{AdvisoryEvaluator, parse_proposal};
pub use evaluator::{DeterministicEvaluator, evaluate, round_rate};
pub use messages::format_dollars;
pub use orchestrator::{NegotiationOrchestrator, RoundOutcome};
pub use policy::NegotiationPolicy;
pub use provider::DecisionProvider;
pub use rate_source::{OfferRequest, RateSource};
pub use types::{Decision, NegotiationRound, Proposal, Status};

use std::sync::Arc;
use std::time::Duration;

use loadbroker_config::{Config, DEFAULT_ADVISORY_TIMEOUT_SECS};
use loadbroker_utils::error::{BrokerError, LlmError};
use loadbroker_utils::logging::log_advisory_fallback;

/// Build an orchestrator from configuration.
///
/// When `[advisory]` is enabled but the provider cannot be constructed, the
/// problem is logged and the orchestrator runs deterministic-only.
///
/// # Errors
///
/// `BrokerError::Config` if the policy section is inconsistent.
pub fn orchestrator_from_config(config: &Config) -> Result<NegotiationOrchestrator, BrokerError> {
    let policy = NegotiationPolicy::from_config(&config.policy)?;
    let orchestrator = NegotiationOrchestrator::new(policy);

    match loadbroker_llm::from_config(config) {
        Ok(Some(backend)) => {
            let timeout = Duration::from_secs(
                config
                    .advisory
                    .timeout_secs
                    .unwrap_or(DEFAULT_ADVISORY_TIMEOUT_SECS),
            );
            let advisory =
                AdvisoryEvaluator::new(backend, loadbroker_llm::DEFAULT_PROVIDER, timeout);
            Ok(orchestrator.with_advisory(Arc::new(advisory), timeout))
        }
        Ok(None) => Ok(orchestrator),
        Err(err @ LlmError::Misconfiguration(_)) => {
            log_advisory_fallback(loadbroker_llm::DEFAULT_PROVIDER, &err.to_string());
            Ok(orchestrator)
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestrator_from_default_config_is_deterministic() {
        let orchestrator = orchestrator_from_config(&Config::default()).unwrap();
        assert!(!orchestrator.has_advisory());
        assert_eq!(orchestrator.policy(), &NegotiationPolicy::default());
    }

    #[test]
    fn test_inconsistent_policy_is_config_error() {
        let mut config = Config::default();
        config.policy.max_attempts = Some(5);
        assert!(matches!(
            orchestrator_from_config(&config),
            Err(BrokerError::Config(_))
        ));
    }
}
