use async_trait::async_trait;

use crate::policy::NegotiationPolicy;
use crate::types::{NegotiationRound, Proposal};
use loadbroker_utils::error::BrokerError;

/// Source of a decision for one negotiation round.
///
/// The deterministic evaluator always succeeds on valid input. Other providers
/// may fail in any way; the orchestrator then answers with the deterministic
/// policy instead.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Short identifier used in logs and traced outcomes
    fn name(&self) -> &str;

    /// Suggest a decision for `round`, which has already been validated.
    async fn propose(
        &self,
        policy: &NegotiationPolicy,
        round: &NegotiationRound,
    ) -> Result<Proposal, BrokerError>;
}
