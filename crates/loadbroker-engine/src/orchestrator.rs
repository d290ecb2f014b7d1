//! Single-round negotiation state transition
//!
//! Each call consumes one [`NegotiationRound`] and returns one [`Decision`].
//! The caller carries `attempts` from one round to the next:
//!
//! ```text
//! attempt=1 ──counter──▶ attempt=2 ──counter──▶ ... ──▶ attempt=max
//!     │                      │                             │
//!  accept/reject          accept/reject            accept/reject (counter forced to reject)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::evaluator::{DeterministicEvaluator, attempt_cap_rejection, evaluate, round_rate};
use crate::messages;
use crate::policy::NegotiationPolicy;
use crate::provider::DecisionProvider;
use crate::types::{Decision, NegotiationRound, Proposal, Status};
use loadbroker_config::DEFAULT_ADVISORY_TIMEOUT_SECS;
use loadbroker_utils::error::NegotiationError;
use loadbroker_utils::logging::{log_advisory_fallback, log_round_decision, negotiation_span};

/// Decision plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub decision: Decision,
    /// Name of the provider whose decision was used
    pub provider: String,
    /// The advisory provider failed and the deterministic policy answered
    pub fallback: bool,
}

/// Runs one negotiation round: picks a provider, then applies the shared
/// post-processing.
///
/// Holds no per-negotiation state and is safe to share across tasks.
#[derive(Clone)]
pub struct NegotiationOrchestrator {
    policy: Arc<NegotiationPolicy>,
    advisory: Option<Arc<dyn DecisionProvider>>,
    advisory_timeout: Duration,
}

impl NegotiationOrchestrator {
    /// Deterministic-only orchestrator.
    #[must_use]
    pub fn new(policy: NegotiationPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
            advisory: None,
            advisory_timeout: Duration::from_secs(DEFAULT_ADVISORY_TIMEOUT_SECS),
        }
    }

    /// Consult `provider` first, falling back to the deterministic policy when
    /// it errors or takes longer than `timeout`.
    #[must_use]
    pub fn with_advisory(mut self, provider: Arc<dyn DecisionProvider>, timeout: Duration) -> Self {
        self.advisory = Some(provider);
        self.advisory_timeout = timeout;
        self
    }

    #[must_use]
    pub fn policy(&self) -> &NegotiationPolicy {
        &self.policy
    }

    #[must_use]
    pub fn has_advisory(&self) -> bool {
        self.advisory.is_some()
    }

    /// Decide one round.
    ///
    /// # Errors
    ///
    /// `NegotiationError::InvalidInput` for degenerate rounds. Advisory
    /// failures never surface here.
    pub async fn negotiate(&self, round: NegotiationRound) -> Result<Decision, NegotiationError> {
        Ok(self.negotiate_traced(round, None).await?.decision)
    }

    /// Decide one round and report which provider answered.
    pub async fn negotiate_traced(
        &self,
        round: NegotiationRound,
        load_id: Option<&str>,
    ) -> Result<RoundOutcome, NegotiationError> {
        let span = negotiation_span(load_id, round.attempt);
        async move {
            round.validate()?;

            let outcome = match &self.advisory {
                Some(provider) => self.consult(provider.as_ref(), &round).await?,
                None => RoundOutcome {
                    decision: evaluate(&self.policy, &round)?,
                    provider: DeterministicEvaluator::NAME.to_string(),
                    fallback: false,
                },
            };

            log_round_decision(
                outcome.decision.status.as_str(),
                outcome.decision.target_rate,
                outcome.decision.attempts,
                &outcome.provider,
            );
            Ok::<_, NegotiationError>(outcome)
        }
        .instrument(span)
        .await
    }

    async fn consult(
        &self,
        provider: &dyn DecisionProvider,
        round: &NegotiationRound,
    ) -> Result<RoundOutcome, NegotiationError> {
        let attempt = tokio::time::timeout(
            self.advisory_timeout,
            provider.propose(&self.policy, round),
        )
        .await;

        let failure = match attempt {
            Ok(Ok(proposal)) => {
                return Ok(RoundOutcome {
                    decision: self.finalize(proposal, round),
                    provider: provider.name().to_string(),
                    fallback: false,
                });
            }
            Ok(Err(err)) => err.to_string(),
            Err(_) => format!("timed out after {:?}", self.advisory_timeout),
        };

        log_advisory_fallback(provider.name(), &failure);
        Ok(RoundOutcome {
            decision: evaluate(&self.policy, round)?,
            provider: DeterministicEvaluator::NAME.to_string(),
            fallback: true,
        })
    }

    /// Post-processing shared by every provider.
    ///
    /// Fills a missing target (offer on accept, board otherwise), forces a
    /// counter at the attempt cap into a rejection, rounds the target and
    /// derives flags and the next attempt count.
    fn finalize(&self, proposal: Proposal, round: &NegotiationRound) -> Decision {
        if proposal.status == Status::Counter && self.policy.attempt_cap_reached(round.attempt) {
            return attempt_cap_rejection(round);
        }

        let fallback_target = match proposal.status {
            Status::Accept => round.offer,
            Status::Counter | Status::Reject => round.board_rate,
        };
        let target = round_rate(proposal.target_rate.unwrap_or(fallback_target));

        let message = proposal.message.unwrap_or_else(|| match proposal.status {
            Status::Accept => messages::accept(target),
            Status::Counter => messages::counter(target),
            Status::Reject => self.rejection_message(round),
        });

        Decision::new(proposal.status, target, message, round.attempt)
    }

    /// Wording for a rejection that arrived without a message: whatever the
    /// policy itself would say for this round, else the cap or out-of-band text.
    fn rejection_message(&self, round: &NegotiationRound) -> String {
        match evaluate(&self.policy, round) {
            Ok(decision) if decision.status == Status::Reject => decision.message,
            _ if self.policy.attempt_cap_reached(round.attempt) => {
                messages::REJECT_ATTEMPT_CAP.to_string()
            }
            _ => messages::REJECT_OUT_OF_BAND.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use loadbroker_llm::LlmError;
    use loadbroker_utils::error::BrokerError;

    struct FixedProvider(Proposal);

    #[async_trait]
    impl DecisionProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn propose(
            &self,
            _policy: &NegotiationPolicy,
            _round: &NegotiationRound,
        ) -> Result<Proposal, BrokerError> {
            Ok(self.0.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl DecisionProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn propose(
            &self,
            _policy: &NegotiationPolicy,
            _round: &NegotiationRound,
        ) -> Result<Proposal, BrokerError> {
            Err(LlmError::InvalidResponse("not json".to_string()).into())
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl DecisionProvider for SlowProvider {
        fn name(&self) -> &str {
            "slow"
        }

        async fn propose(
            &self,
            _policy: &NegotiationPolicy,
            _round: &NegotiationRound,
        ) -> Result<Proposal, BrokerError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Proposal {
                status: Status::Accept,
                target_rate: None,
                message: None,
            })
        }
    }

    fn with(provider: impl DecisionProvider + 'static) -> NegotiationOrchestrator {
        NegotiationOrchestrator::new(NegotiationPolicy::default())
            .with_advisory(Arc::new(provider), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_deterministic_only() {
        let orchestrator = NegotiationOrchestrator::new(NegotiationPolicy::default());
        let outcome = orchestrator
            .negotiate_traced(NegotiationRound::new(2000.0, 2500.0, 1), Some("L1"))
            .await
            .unwrap();
        assert_eq!(outcome.provider, "deterministic");
        assert!(!outcome.fallback);
        assert_eq!(outcome.decision.target_rate, 2400.0);
        assert_eq!(outcome.decision.attempts, 2);
    }

    #[tokio::test]
    async fn test_invalid_round_is_rejected_before_any_provider() {
        let err = with(FailingProvider)
            .negotiate(NegotiationRound::new(0.0, 1900.0, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, NegotiationError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_advisory_proposal_is_post_processed() {
        let outcome = with(FixedProvider(Proposal {
            status: Status::Counter,
            target_rate: Some(2350.4),
            message: None,
        }))
        .negotiate_traced(NegotiationRound::new(2000.0, 2500.0, 1), None)
        .await
        .unwrap();

        assert_eq!(outcome.provider, "fixed");
        assert!(!outcome.fallback);
        let d = outcome.decision;
        assert_eq!(d.status, Status::Counter);
        assert_eq!(d.target_rate, 2350.0);
        assert_eq!(d.message, "I can do $2,350. Does that work?");
        assert!(!d.is_final && !d.handoff);
        assert_eq!(d.attempts, 2);
    }

    #[tokio::test]
    async fn test_missing_target_is_filled_from_offer_or_board() {
        let accept = with(FixedProvider(Proposal {
            status: Status::Accept,
            target_rate: None,
            message: None,
        }))
        .negotiate(NegotiationRound::new(2000.0, 1950.4, 1))
        .await
        .unwrap();
        assert_eq!(accept.target_rate, 1950.0);
        assert!(accept.handoff && accept.is_final);

        let reject = with(FixedProvider(Proposal {
            status: Status::Reject,
            target_rate: None,
            message: Some("No thanks.".to_string()),
        }))
        .negotiate(NegotiationRound::new(2000.0, 1950.0, 1))
        .await
        .unwrap();
        assert_eq!(reject.target_rate, 2000.0);
        assert_eq!(reject.message, "No thanks.");
        assert!(!reject.handoff && reject.is_final);
    }

    #[tokio::test]
    async fn test_attempt_cap_applies_to_advisory_counter() {
        let d = with(FixedProvider(Proposal {
            status: Status::Counter,
            target_rate: Some(2300.0),
            message: Some("How about $2,300?".to_string()),
        }))
        .negotiate(NegotiationRound::new(2000.0, 2500.0, 3))
        .await
        .unwrap();
        assert_eq!(d.status, Status::Reject);
        assert_eq!(d.target_rate, 2000.0);
        assert_eq!(d.attempts, 3);
        assert!(d.message.starts_with("I appreciate the negotiation."));
    }

    #[tokio::test]
    async fn test_bare_advisory_reject_uses_policy_wording() {
        let bare_reject = || {
            with(FixedProvider(Proposal {
                status: Status::Reject,
                target_rate: None,
                message: None,
            }))
        };

        // Over-ask on the last round: the policy rejects on the attempt cap
        let d = bare_reject()
            .negotiate(NegotiationRound::new(2000.0, 2500.0, 3))
            .await
            .unwrap();
        assert_eq!(d.message, messages::REJECT_ATTEMPT_CAP);

        // Accept-band offer on the last round still reads as the cap
        let d = bare_reject()
            .negotiate(NegotiationRound::new(2000.0, 1950.0, 3))
            .await
            .unwrap();
        assert_eq!(d.message, messages::REJECT_ATTEMPT_CAP);

        // Deep lowball on the last round is out of band either way
        let d = bare_reject()
            .negotiate(NegotiationRound::new(2000.0, 1200.0, 3))
            .await
            .unwrap();
        assert_eq!(d.message, messages::REJECT_OUT_OF_BAND);

        let d = bare_reject()
            .negotiate(NegotiationRound::new(2000.0, 1500.0, 1))
            .await
            .unwrap();
        assert_eq!(d.message, messages::REJECT_OUT_OF_BAND);
    }

    #[tokio::test]
    async fn test_provider_error_falls_back() {
        let outcome = with(FailingProvider)
            .negotiate_traced(NegotiationRound::new(2000.0, 2500.0, 1), None)
            .await
            .unwrap();
        assert!(outcome.fallback);
        assert_eq!(outcome.provider, "deterministic");
        assert_eq!(
            outcome.decision,
            evaluate(&NegotiationPolicy::default(), &NegotiationRound::new(2000.0, 2500.0, 1))
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_provider_timeout_falls_back() {
        let outcome = with(SlowProvider)
            .negotiate_traced(NegotiationRound::new(2000.0, 1500.0, 1), None)
            .await
            .unwrap();
        assert!(outcome.fallback);
        assert_eq!(outcome.decision.status, Status::Counter);
        assert_eq!(outcome.decision.target_rate, 1600.0);
    }
}
