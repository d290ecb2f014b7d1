//! Advisory evaluator backed by a language model
//!
//! The model receives the round and the policy rules and must answer with a
//! JSON object `{status, target_rate, message}`. Anything else is a provider
//! failure; the orchestrator then uses the deterministic policy.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::policy::NegotiationPolicy;
use crate::provider::DecisionProvider;
use crate::types::{NegotiationRound, Proposal, Status};
use loadbroker_llm::{LlmBackend, LlmError, LlmInvocation, Message};
use loadbroker_utils::error::BrokerError;

const SYSTEM_PROMPT: &str = "You are an expert freight broker negotiating a carrier rate.\n\
Return only a JSON object with keys: status ('accept'|'counter'|'reject'), \
target_rate (number), message (string). Values are whole US dollars.";

/// Decision provider that consults an LLM backend.
pub struct AdvisoryEvaluator {
    backend: Box<dyn LlmBackend>,
    name: String,
    timeout: Duration,
}

impl AdvisoryEvaluator {
    /// `timeout` bounds the HTTP call; the orchestrator applies its own bound on top.
    pub fn new(backend: Box<dyn LlmBackend>, name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            backend,
            name: name.into(),
            timeout,
        }
    }

    fn build_prompt(policy: &NegotiationPolicy, round: &NegotiationRound) -> String {
        let step = policy.counter_step(round.attempt);
        let cap = policy.high_side_cap(round.attempt);
        format!(
            "Board rate: {board:.2}\n\
             Carrier offer: {offer:.2}\n\
             Attempt: {attempt} of {max}\n\
             \n\
             Rules:\n\
             - Accept if |offer - board| <= {accept:.2} * board\n\
             - If the offer is above board, counter at offer - {step:.2} * board, never above {ceiling:.2}\n\
             - If the offer is below board by at most {negotiate:.2} * board, counter at offer + {step:.2} * board\n\
             - Reject if the offer is further below board than that\n\
             - Reject instead of countering once attempt {max} is reached",
            board = round.board_rate,
            offer = round.offer,
            attempt = round.attempt,
            max = policy.max_attempts(),
            accept = policy.accept_within(),
            negotiate = policy.negotiate_within(),
            step = step,
            ceiling = round.board_rate * (1.0 + cap),
        )
    }
}

#[async_trait]
impl DecisionProvider for AdvisoryEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn propose(
        &self,
        policy: &NegotiationPolicy,
        round: &NegotiationRound,
    ) -> Result<Proposal, BrokerError> {
        let invocation = LlmInvocation::new(
            "",
            self.timeout,
            vec![
                Message::system(SYSTEM_PROMPT),
                Message::user(Self::build_prompt(policy, round)),
            ],
        );

        let result = self.backend.invoke(invocation).await?;
        debug!(
            provider = %result.provider,
            model = %result.model_used,
            "Advisory response received"
        );

        Ok(parse_proposal(&result.raw_response)?)
    }
}

#[derive(Debug, Deserialize)]
struct RawProposal {
    status: String,
    #[serde(default)]
    target_rate: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Strip a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Numbers pass through; strings such as `"$2,400"` are cleaned and parsed.
fn parse_rate(value: &Value) -> Result<Option<f64>, LlmError> {
    let rate = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
                .collect();
            if cleaned.is_empty() {
                return Ok(None);
            }
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };

    match rate {
        Some(r) if r.is_finite() && r > 0.0 => Ok(Some(r)),
        _ => Err(LlmError::InvalidResponse(format!(
            "target_rate is not a positive amount: {value}"
        ))),
    }
}

/// Parse a model response into a proposal.
///
/// # Errors
///
/// `LlmError::InvalidResponse` when the text is not a JSON object with a known
/// status and, if present, a positive target rate.
pub fn parse_proposal(text: &str) -> Result<Proposal, LlmError> {
    let raw: RawProposal = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| LlmError::InvalidResponse(format!("not a decision object: {e}")))?;

    let status = raw
        .status
        .parse::<Status>()
        .map_err(LlmError::InvalidResponse)?;

    let target_rate = match &raw.target_rate {
        Some(value) => parse_rate(value)?,
        None => None,
    };

    let message = raw
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    Ok(Proposal {
        status,
        target_rate,
        message,
    })
}
