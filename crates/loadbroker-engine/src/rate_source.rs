//! Board rate lookup and offer request validation

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::policy::NegotiationPolicy;
use crate::types::NegotiationRound;
use loadbroker_utils::error::NegotiationError;

/// Synchronous board rate lookup by load identifier.
pub trait RateSource: Send + Sync {
    /// Posted rate for `load_id`, or `None` if the load is unknown.
    fn lookup(&self, load_id: &str) -> Option<f64>;
}

impl RateSource for HashMap<String, f64> {
    fn lookup(&self, load_id: &str) -> Option<f64> {
        self.get(load_id).copied()
    }
}

/// Offer as received at the call boundary.
///
/// Exactly one of `load_id` and `board_rate` identifies the board rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRequest {
    #[serde(default)]
    pub load_id: Option<String>,
    #[serde(default)]
    pub board_rate: Option<f64>,
    pub offer: f64,
    #[serde(default = "first_attempt")]
    pub attempt: u32,
}

fn first_attempt() -> u32 {
    1
}

impl OfferRequest {
    /// Validate the request and resolve its board rate into a round.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when neither or both rate sources are given, the offer
    ///   is not positive, or `attempt` is outside `[1, max_attempts]`
    /// - `LoadNotFound` when `rates` has no entry for `load_id`
    pub fn resolve(
        &self,
        rates: &dyn RateSource,
        policy: &NegotiationPolicy,
    ) -> Result<NegotiationRound, NegotiationError> {
        let max = policy.max_attempts();
        if self.attempt == 0 || self.attempt > max {
            return Err(NegotiationError::invalid_input(
                "attempt",
                format!("{} (must be between 1 and {max})", self.attempt),
            ));
        }

        let board_rate = match (&self.load_id, self.board_rate) {
            (Some(load_id), None) => {
                rates
                    .lookup(load_id)
                    .ok_or_else(|| NegotiationError::LoadNotFound {
                        load_id: load_id.clone(),
                    })?
            }
            (None, Some(rate)) => rate,
            (Some(_), Some(_)) => {
                return Err(NegotiationError::invalid_input(
                    "board_rate",
                    "give either load_id or board_rate, not both",
                ));
            }
            (None, None) => {
                return Err(NegotiationError::invalid_input(
                    "load_id",
                    "either load_id or board_rate is required",
                ));
            }
        };

        let round = NegotiationRound::new(board_rate, self.offer, self.attempt);
        round.validate()?;
        Ok(round)
    }
}
