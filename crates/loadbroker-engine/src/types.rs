//! Negotiation round input and decision output

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use loadbroker_utils::error::NegotiationError;

/// One negotiation round as supplied by the caller.
///
/// Rounds carry all negotiation state; nothing is kept between calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NegotiationRound {
    /// Posted rate for the load
    pub board_rate: f64,
    /// Carrier's ask for this round
    pub offer: f64,
    /// 1-based count of rounds consumed before this one
    pub attempt: u32,
}

impl NegotiationRound {
    #[must_use]
    pub fn new(board_rate: f64, offer: f64, attempt: u32) -> Self {
        Self {
            board_rate,
            offer,
            attempt,
        }
    }

    /// Reject degenerate input before any ratio is computed.
    pub fn validate(&self) -> Result<(), NegotiationError> {
        if !self.board_rate.is_finite() || self.board_rate <= 0.0 {
            return Err(NegotiationError::invalid_input(
                "board_rate",
                format!("{} (must be a positive amount)", self.board_rate),
            ));
        }
        if !self.offer.is_finite() || self.offer <= 0.0 {
            return Err(NegotiationError::invalid_input(
                "offer",
                format!("{} (must be a positive amount)", self.offer),
            ));
        }
        if self.attempt == 0 {
            return Err(NegotiationError::invalid_input(
                "attempt",
                "0 (attempts are counted from 1)",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Accept,
    Counter,
    Reject,
}

impl Status {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Counter => "counter",
            Self::Reject => "reject",
        }
    }

    /// Terminal decisions end the negotiation.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Counter)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "counter" => Ok(Self::Counter),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// Completed decision for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub status: Status,
    /// Whole-dollar rate proposed or confirmed
    pub target_rate: f64,
    pub message: String,
    /// Set only on accept: a human representative takes over
    pub handoff: bool,
    #[serde(rename = "final")]
    pub is_final: bool,
    /// Attempt value the caller supplies on the next round
    pub attempts: u32,
}

impl Decision {
    /// Assemble a decision, deriving the control flags and next attempt count
    /// from `status`.
    #[must_use]
    pub fn new(status: Status, target_rate: f64, message: String, attempt: u32) -> Self {
        Self {
            status,
            target_rate,
            message,
            handoff: status == Status::Accept,
            is_final: status.is_terminal(),
            attempts: if status == Status::Counter {
                attempt.saturating_add(1)
            } else {
                attempt
            },
        }
    }
}

/// A provider's suggestion before post-processing.
///
/// Missing fields are filled in by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub status: Status,
    pub target_rate: Option<f64>,
    pub message: Option<String>,
}

impl From<Decision> for Proposal {
    fn from(decision: Decision) -> Self {
        Self {
            status: decision.status,
            target_rate: Some(decision.target_rate),
            message: Some(decision.message),
        }
    }
}
