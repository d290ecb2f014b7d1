//! Deterministic policy evaluator
//!
//! Closed-form decision for one round. Checks run in a fixed order, and that
//! order settles ties: the accept band first, then the above/below board split,
//! then the attempt cap.

use async_trait::async_trait;

use crate::messages;
use crate::policy::NegotiationPolicy;
use crate::provider::DecisionProvider;
use crate::types::{Decision, NegotiationRound, Proposal, Status};
use loadbroker_utils::error::{BrokerError, NegotiationError};

/// Whole-currency rounding used for every returned rate (half to even).
#[must_use]
pub fn round_rate(rate: f64) -> f64 {
    rate.round_ties_even()
}

/// Rejection once the attempt cap turns a counter into a terminal decision.
pub(crate) fn attempt_cap_rejection(round: &NegotiationRound) -> Decision {
    Decision::new(
        Status::Reject,
        round_rate(round.board_rate),
        messages::REJECT_ATTEMPT_CAP.to_string(),
        round.attempt,
    )
}

/// Evaluate one round under `policy`.
///
/// # Errors
///
/// `NegotiationError::InvalidInput` for a non-positive board rate or offer, or
/// a zero attempt. No decision is computed in that case.
pub fn evaluate(
    policy: &NegotiationPolicy,
    round: &NegotiationRound,
) -> Result<Decision, NegotiationError> {
    round.validate()?;

    let board = round.board_rate;
    let offer = round.offer;
    let gap = offer - board;
    let abs_pct = gap.abs() / board;

    if abs_pct <= policy.accept_within() {
        let rate = round_rate(offer);
        return Ok(Decision::new(
            Status::Accept,
            rate,
            messages::accept(rate),
            round.attempt,
        ));
    }

    let step = policy.counter_step(round.attempt);
    let high_ceiling = board * (1.0 + policy.high_side_cap(round.attempt));

    let target = if gap >= 0.0 {
        // Over-ask: concede toward board but never above the ceiling
        (offer - board * step).min(high_ceiling)
    } else {
        let low_pct = (board - offer) / board;
        if low_pct > policy.negotiate_within() {
            return Ok(Decision::new(
                Status::Reject,
                round_rate(board),
                messages::REJECT_OUT_OF_BAND.to_string(),
                round.attempt,
            ));
        }
        offer + board * step
    };

    if policy.attempt_cap_reached(round.attempt) {
        return Ok(attempt_cap_rejection(round));
    }

    let target = round_rate(target);
    Ok(Decision::new(
        Status::Counter,
        target,
        messages::counter(target),
        round.attempt,
    ))
}

/// [`DecisionProvider`] backed by [`evaluate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicEvaluator;

impl DeterministicEvaluator {
    pub const NAME: &'static str = "deterministic";
}

#[async_trait]
impl DecisionProvider for DeterministicEvaluator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn propose(
        &self,
        policy: &NegotiationPolicy,
        round: &NegotiationRound,
    ) -> Result<Proposal, BrokerError> {
        Ok(evaluate(policy, round)?.into())
    }
}
